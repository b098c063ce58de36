//! GroupMe API client: latest-message poll, group member list, bot post,
//! and image upload. All endpoints wrap their results in a
//! `{meta, response}` envelope that is checked before use.

use crate::compose::{Attachment, OutboundPayload};
use crate::members::Participant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "https://api.groupme.com/v3";
const DEFAULT_IMAGE_BASE: &str = "https://image.groupme.com";

#[derive(Debug, thiserror::Error)]
pub enum GroupmeError {
    #[error("groupme request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("groupme api error: {0}")]
    Api(String),
}

/// Who authored a message on the platform side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    User,
    Bot,
    #[serde(other)]
    Other,
}

/// One message observed from the group, read-only to the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    pub sender_type: SenderKind,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    response: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    code: u16,
}

impl<T> Envelope<T> {
    /// Unwrap the response, turning a non-200 `meta.code` into an API error.
    fn into_response(self) -> Result<Option<T>, GroupmeError> {
        if let Some(meta) = &self.meta {
            if meta.code < 200 || meta.code >= 300 {
                return Err(GroupmeError::Api(format!("meta code {}", meta.code)));
            }
        }
        Ok(self.response)
    }
}

#[derive(Debug, Default, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<InboundMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    payload: UploadPayload,
}

#[derive(Debug, Deserialize)]
struct UploadPayload {
    url: String,
}

#[derive(Serialize)]
struct BotPost<'a> {
    bot_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "<[Attachment]>::is_empty")]
    attachments: &'a [Attachment],
}

/// Client for the GroupMe HTTP API. Credentials are optional per feature:
/// `bot_id` for posting, `group_id` + `access_token` for reading the group.
#[derive(Clone)]
pub struct GroupmeClient {
    api_base: String,
    image_base: String,
    bot_id: Option<String>,
    group_id: Option<String>,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl GroupmeClient {
    pub fn new(
        bot_id: Option<String>,
        group_id: Option<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            bot_id,
            group_id,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URLs (for tests or custom endpoints).
    pub fn with_bases(mut self, api_base: &str, image_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.image_base = image_base.trim_end_matches('/').to_string();
        self
    }

    fn group_id(&self) -> Result<&str, GroupmeError> {
        self.group_id
            .as_deref()
            .ok_or_else(|| GroupmeError::Api("group id not configured".to_string()))
    }

    fn access_token(&self) -> Result<&str, GroupmeError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| GroupmeError::Api("access token not configured".to_string()))
    }

    /// GET /groups/{id}/messages?limit=1 — the newest message in the group,
    /// or `None` when the group has no messages.
    pub async fn fetch_latest(&self) -> Result<Option<InboundMessage>, GroupmeError> {
        let url = format!("{}/groups/{}/messages", self.api_base, self.group_id()?);
        let res = self
            .client
            .get(&url)
            .query(&[("token", self.access_token()?), ("limit", "1")])
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GroupmeError::Api(format!("{} {}", status, body)));
        }
        let data: Envelope<MessagesResponse> = res.json().await?;
        Ok(data
            .into_response()?
            .and_then(|r| r.messages.into_iter().next()))
    }

    /// GET /groups/{id}/members — the group's current member list.
    pub async fn fetch_members(&self) -> Result<Vec<Participant>, GroupmeError> {
        let url = format!("{}/groups/{}/members", self.api_base, self.group_id()?);
        let res = self
            .client
            .get(&url)
            .query(&[("token", self.access_token()?)])
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GroupmeError::Api(format!("{} {}", status, body)));
        }
        let data: Envelope<MembersResponse> = res.json().await?;
        Ok(data.into_response()?.map(|r| r.members).unwrap_or_default())
    }

    /// POST /bots/post — send a composed payload as the bot. GroupMe
    /// acknowledges with 202; any 2xx counts as delivered.
    pub async fn post(&self, payload: &OutboundPayload) -> Result<(), GroupmeError> {
        let bot_id = self
            .bot_id
            .as_deref()
            .ok_or_else(|| GroupmeError::Api("bot id not configured".to_string()))?;
        let url = format!("{}/bots/post", self.api_base);
        let body = BotPost {
            bot_id,
            text: &payload.text,
            attachments: &payload.attachments,
        };
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GroupmeError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }

    /// POST the raw image bytes to the image service; returns the hosted URL.
    pub async fn upload_image(&self, bytes: Vec<u8>) -> Result<String, GroupmeError> {
        let url = format!("{}/pictures", self.image_base);
        let res = self
            .client
            .post(&url)
            .header("X-Access-Token", self.access_token()?)
            .header("Content-Type", "image")
            .body(bytes)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GroupmeError::Api(format!("{} {}", status, body)));
        }
        let data: UploadResponse = res.json().await?;
        Ok(data.payload.url)
    }
}

#[async_trait::async_trait]
impl crate::members::DirectoryService for GroupmeClient {
    async fn fetch_participants(&self) -> Result<Vec<Participant>, GroupmeError> {
        self.fetch_members().await
    }
}
