//! Outbound composer: turn a decided intent into a wire-ready payload with
//! correctly placed attachments and mention offsets.

use crate::engine::OutboundIntent;
use crate::members::Participant;
use serde::Serialize;

/// Label used when a mention target cannot be resolved to a member.
const MENTION_FALLBACK: &str = "user";

const VIDEO_HOST: &str = "v.groupme.com";
const PREVIEW_HOST: &str = "i.groupme.com";

/// GroupMe message attachment, serialized with its wire `type` tag.
/// Mention `loci` entries are `[start, len]` character offsets into the
/// final message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    Image {
        url: String,
    },
    Video {
        url: String,
        preview_url: String,
    },
    Mentions {
        user_ids: Vec<String>,
        loci: Vec<[usize; 2]>,
    },
    Reply {
        reply_id: String,
        base_reply_id: String,
    },
}

/// A composed message ready for the send boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundPayload {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Compose the final payload. `mention` is the resolved participant for the
/// intent's mention target, when there is one.
///
/// Returns `None` when the result would be empty; that case is a
/// decision-engine defect and is dropped here rather than sent.
pub fn compose(intent: &OutboundIntent, mention: Option<&Participant>) -> Option<OutboundPayload> {
    let mut text = intent.text.clone().unwrap_or_default();
    let mut attachments = Vec::new();

    if let Some(user_id) = &intent.mention_target {
        let name = mention
            .map(|p| p.nickname.as_str())
            .unwrap_or(MENTION_FALLBACK);
        let mention_text = format!("@{}", name);
        // Offsets refer to the final text, so prefix first, then measure.
        let len = mention_text.chars().count();
        text = if text.is_empty() {
            mention_text
        } else {
            format!("{} {}", mention_text, text)
        };
        attachments.push(Attachment::Mentions {
            user_ids: vec![user_id.clone()],
            loci: vec![[0, len]],
        });
    }

    if let Some(url) = &intent.image_ref {
        attachments.push(Attachment::Image { url: url.clone() });
    }

    if let Some(url) = &intent.video_ref {
        match preview_url(url) {
            Some(preview) => attachments.push(Attachment::Video {
                url: url.clone(),
                preview_url: preview,
            }),
            None => log::warn!("dropping video with unrecognized extension: {}", url),
        }
    }

    if let Some(reply_id) = &intent.reply_target {
        attachments.push(Attachment::Reply {
            reply_id: reply_id.clone(),
            base_reply_id: reply_id.clone(),
        });
    }

    attachments.extend(intent.extra_attachments.iter().cloned());

    if text.is_empty() && attachments.is_empty() {
        log::warn!("refusing to compose an empty payload");
        return None;
    }

    Some(OutboundPayload { text, attachments })
}

/// Preview image URL for a hosted video: same path on the image host with a
/// `.jpg` extension. Only `.mp4` URLs are recognized.
fn preview_url(video_url: &str) -> Option<String> {
    let stem = video_url.strip_suffix(".mp4")?;
    Some(format!("{}.jpg", stem.replace(VIDEO_HOST, PREVIEW_HOST)))
}
