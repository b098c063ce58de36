//! Response decision engine: the probability cascade that turns one inbound
//! message into an outbound intent, or stays quiet.
//!
//! Paths are strictly ordered — joke, quotify, then the general responder —
//! and the first path whose draw succeeds (and whose transform produced
//! output) wins. Jokes sit above the general responder on purpose: they are
//! the rarer, sharper reactions.

use crate::compose::Attachment;
use crate::config::Probabilities;
use crate::content::{ContentCategory, ContentSource, MediaCategory};
use crate::groupme::{InboundMessage, SenderKind};
use crate::members::MemberDirectory;
use crate::random::Draw;
use crate::transform;

/// Per-word wrap probability used once the quotify path has been chosen.
pub const QUOTIFY_WORD_PROBABILITY: f64 = 0.25;

/// The decided, not-yet-serialized content and targets for a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundIntent {
    pub text: Option<String>,
    pub image_ref: Option<String>,
    pub video_ref: Option<String>,
    /// User id to mention; resolved to a display name at composition.
    pub mention_target: Option<String>,
    /// Inbound message id this reply links back to.
    pub reply_target: Option<String>,
    /// Precomputed attachments passed through composition verbatim.
    pub extra_attachments: Vec<Attachment>,
}

impl OutboundIntent {
    fn reply_to(message: &InboundMessage) -> Self {
        Self {
            reply_target: Some(message.id.clone()),
            ..Default::default()
        }
    }

    fn has_content(&self) -> bool {
        self.text.is_some()
            || self.image_ref.is_some()
            || self.video_ref.is_some()
            || !self.extra_attachments.is_empty()
    }
}

/// Run the probability cascade for one inbound message.
pub async fn decide(
    message: &InboundMessage,
    probabilities: &Probabilities,
    content: &dyn ContentSource,
    directory: &mut MemberDirectory,
    draw: &mut dyn Draw,
) -> Option<OutboundIntent> {
    if message.sender_type == SenderKind::Bot {
        return None;
    }

    let text = message.text.as_deref().unwrap_or("");

    if let Some(joke) = transform::hardly_know_her(text) {
        if draw.chance(probabilities.hardly_know_her_probability) {
            log::info!("responding with a 'hardly know her' joke");
            return Some(OutboundIntent {
                text: Some(joke),
                ..OutboundIntent::reply_to(message)
            });
        }
    }

    if draw.chance(probabilities.quotify_probability) && !text.is_empty() {
        // When no word gets wrapped, fall through instead of echoing the
        // message unchanged.
        if let Some(quotified) = transform::quotify(text, QUOTIFY_WORD_PROBABILITY, draw) {
            log::info!("responding with a quotified message");
            return Some(OutboundIntent {
                text: Some(quotified),
                ..OutboundIntent::reply_to(message)
            });
        }
    }

    if !draw.chance(probabilities.response_probability) {
        log::debug!("not responding to message {} (random chance)", message.id);
        return None;
    }

    let mut include_text = draw.chance(probabilities.include_text_probability);
    let mut include_media = draw.chance(probabilities.include_media_probability);
    let include_mention = draw.chance(probabilities.include_mention_probability);
    let callout = draw.chance(probabilities.callout_probability);

    // Guarantee non-empty content: force one of text/media by coin flip.
    if !include_text && !include_media {
        if draw.chance(0.5) {
            include_text = true;
        } else {
            include_media = true;
        }
    }

    if callout {
        if let Some(member) = directory.random_participant(draw).await {
            let mention_text = format!("@{}", member.nickname);
            let len = mention_text.chars().count();
            log::info!("calling out {}", member.nickname);
            return Some(OutboundIntent {
                text: Some(format!("{}, I'm calling you out!", mention_text)),
                extra_attachments: vec![Attachment::Mentions {
                    user_ids: vec![member.user_id],
                    loci: vec![[0, len]],
                }],
                ..OutboundIntent::reply_to(message)
            });
        }
        // No member available: fall through to the normal assembly.
    }

    let mut intent = OutboundIntent::reply_to(message);

    if include_text {
        intent.text = content.random_line(ContentCategory::Quotes);
    }

    if include_media {
        let category = MediaCategory::ALL[draw.index(MediaCategory::ALL.len())];
        let media = content.random_line(category.content_category());
        match category {
            MediaCategory::Images | MediaCategory::Gifs => intent.image_ref = media,
            MediaCategory::Videos => intent.video_ref = media,
        }
    }

    if include_mention {
        intent.mention_target = directory
            .random_participant(draw)
            .await
            .map(|p| p.user_id);
    }

    if !intent.has_content() {
        log::debug!("nothing selected for message {}, staying quiet", message.id);
        return None;
    }
    Some(intent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groupme::GroupmeError;
    use crate::members::{DirectoryService, Participant};
    use crate::random::ScriptedDraw;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn message(id: &str, text: &str, sender_type: SenderKind) -> InboundMessage {
        InboundMessage {
            id: id.to_string(),
            text: if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            },
            sender_type,
            user_id: Some("42".to_string()),
            name: Some("Sender".to_string()),
            created_at: Utc::now(),
        }
    }

    struct FixedContent {
        quote: Option<String>,
        media: Option<String>,
    }

    impl FixedContent {
        fn full() -> Self {
            Self {
                quote: Some("stay hungry".to_string()),
                media: Some("https://i.groupme.com/a.jpg".to_string()),
            }
        }

        fn empty() -> Self {
            Self {
                quote: None,
                media: None,
            }
        }
    }

    impl ContentSource for FixedContent {
        fn random_line(&self, category: ContentCategory) -> Option<String> {
            match category {
                ContentCategory::Quotes => self.quote.clone(),
                _ => self.media.clone(),
            }
        }
    }

    struct StaticDirectory(Vec<Participant>);

    #[async_trait]
    impl DirectoryService for StaticDirectory {
        async fn fetch_participants(&self) -> Result<Vec<Participant>, GroupmeError> {
            Ok(self.0.clone())
        }
    }

    fn directory(members: Vec<Participant>) -> MemberDirectory {
        MemberDirectory::new(Arc::new(StaticDirectory(members)), Duration::from_secs(3600))
    }

    fn alice() -> Participant {
        Participant {
            user_id: "1".to_string(),
            nickname: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn bot_messages_are_never_answered() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        // An empty script proves no probability is even consulted.
        let mut draw = ScriptedDraw::default();
        let msg = message("5", "he runs faster", SenderKind::Bot);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw).await;
        assert_eq!(intent, None);
    }

    #[tokio::test]
    async fn joke_path_short_circuits_everything_else() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        let mut draw = ScriptedDraw::new([true], []);
        let msg = message("5", "he runs faster", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("joke intent");
        assert_eq!(intent.text.as_deref(), Some("Fast her? I hardly know her!"));
        assert_eq!(intent.reply_target.as_deref(), Some("5"));
        assert_eq!(intent.image_ref, None);
        assert_eq!(intent.mention_target, None);
    }

    #[tokio::test]
    async fn quotify_with_no_wrapped_word_falls_through() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        // quotify path chosen, both word draws miss, then the general
        // response draw misses too.
        let mut draw = ScriptedDraw::new([true, false, false, false], []);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw).await;
        assert_eq!(intent, None);
    }

    #[tokio::test]
    async fn quotify_sends_the_decorated_text() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        let mut draw = ScriptedDraw::new([true, true, false], []);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("quotify intent");
        assert_eq!(intent.text.as_deref(), Some("\"hello\" world"));
        assert_eq!(intent.reply_target.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn forcing_rule_guarantees_content_via_text() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        // quotify miss, response hit, all includes and callout miss,
        // forcing coin picks text.
        let mut draw = ScriptedDraw::new([false, true, false, false, false, false, true], []);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("forced intent");
        assert_eq!(intent.text.as_deref(), Some("stay hungry"));
        assert_eq!(intent.image_ref, None);
        assert_eq!(intent.video_ref, None);
    }

    #[tokio::test]
    async fn forcing_rule_guarantees_content_via_media() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        // Same as above but the coin picks media; index 0 selects images.
        let mut draw = ScriptedDraw::new([false, true, false, false, false, false, false], [0]);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("forced intent");
        assert_eq!(intent.text, None);
        assert_eq!(intent.image_ref.as_deref(), Some("https://i.groupme.com/a.jpg"));
    }

    #[tokio::test]
    async fn callout_overrides_the_independent_draws() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        // quotify miss, response hit, text/media/mention all hit, callout
        // hit; the member index draw picks Alice.
        let mut draw = ScriptedDraw::new([false, true, true, true, true, true], [0]);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("callout intent");
        assert_eq!(intent.text.as_deref(), Some("@Alice, I'm calling you out!"));
        assert_eq!(intent.reply_target.as_deref(), Some("5"));
        assert_eq!(intent.image_ref, None);
        assert_eq!(intent.mention_target, None);
        assert_eq!(
            intent.extra_attachments,
            vec![Attachment::Mentions {
                user_ids: vec!["1".to_string()],
                loci: vec![[0, 6]],
            }]
        );
    }

    #[tokio::test]
    async fn callout_without_members_falls_back_to_normal_assembly() {
        let probabilities = Probabilities::default();
        let mut dir = directory(Vec::new());
        // Callout hit, but the directory is empty; include_text carries the
        // response instead.
        let mut draw = ScriptedDraw::new([false, true, true, false, false, true], []);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("fallback intent");
        assert_eq!(intent.text.as_deref(), Some("stay hungry"));
        assert!(intent.extra_attachments.is_empty());
    }

    #[tokio::test]
    async fn mention_target_comes_from_the_directory() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        let mut draw = ScriptedDraw::new([false, true, true, false, true, false], [0]);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("intent");
        assert_eq!(intent.mention_target.as_deref(), Some("1"));
        assert_eq!(intent.reply_target.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn unavailable_content_means_no_response() {
        let probabilities = Probabilities::default();
        let mut dir = directory(Vec::new());
        // Text selected but the quotes file is empty, no media, no mention.
        let mut draw = ScriptedDraw::new([false, true, true, false, false, false], []);
        let msg = message("5", "hello world", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::empty(), &mut dir, &mut draw).await;
        assert_eq!(intent, None);
    }

    #[tokio::test]
    async fn messages_without_text_still_get_general_responses() {
        let probabilities = Probabilities::default();
        let mut dir = directory(vec![alice()]);
        // No text: the joke path never matches, so the first draw is
        // quotify (consumed even though there is nothing to transform).
        let mut draw = ScriptedDraw::new([true, true, true, false, false, false], []);
        let msg = message("5", "", SenderKind::User);
        let intent = decide(&msg, &probabilities, &FixedContent::full(), &mut dir, &mut draw)
            .await
            .expect("intent");
        assert_eq!(intent.text.as_deref(), Some("stay hungry"));
    }
}
