//! Member directory: a TTL cache over the group's member list.
//!
//! The cache is replaced wholesale on refresh. A failed refresh keeps
//! serving whatever was cached before, so mentions degrade instead of
//! disappearing; an empty cache that has never loaded stays empty.

use crate::groupme::GroupmeError;
use crate::random::Draw;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One group member as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub nickname: String,
}

/// External directory of group members.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn fetch_participants(&self) -> Result<Vec<Participant>, GroupmeError>;
}

/// Cached view of the member list, refreshed from the directory service
/// when older than `ttl`.
pub struct MemberDirectory {
    service: Arc<dyn DirectoryService>,
    ttl: Duration,
    entries: Vec<Participant>,
    fetched_at: Option<Instant>,
}

impl MemberDirectory {
    pub fn new(service: Arc<dyn DirectoryService>, ttl: Duration) -> Self {
        Self {
            service,
            ttl,
            entries: Vec::new(),
            fetched_at: None,
        }
    }

    /// Current members, refreshing the cache first when it has expired.
    pub async fn participants(&mut self) -> &[Participant] {
        let fresh = matches!(self.fetched_at, Some(at) if at.elapsed() < self.ttl);
        if !fresh {
            match self.service.fetch_participants().await {
                Ok(members) => {
                    log::info!("member directory: loaded {} members", members.len());
                    self.entries = members;
                    self.fetched_at = Some(Instant::now());
                }
                Err(e) => {
                    log::warn!(
                        "member directory: refresh failed, keeping {} cached entries: {}",
                        self.entries.len(),
                        e
                    );
                }
            }
        }
        &self.entries
    }

    /// Uniform-random member, or `None` when the directory is empty.
    pub async fn random_participant(&mut self, draw: &mut dyn Draw) -> Option<Participant> {
        let members = self.participants().await;
        if members.is_empty() {
            return None;
        }
        let pick = draw.index(members.len());
        Some(members[pick].clone())
    }

    /// Look up a member by user id in the current cache.
    pub async fn resolve(&mut self, user_id: &str) -> Option<Participant> {
        self.participants()
            .await
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned()
    }
}
