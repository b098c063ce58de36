//! Poll loop and dedup tracking: fetch the latest group message, hand new
//! user messages to the decision engine, compose, and send.
//!
//! One cycle runs fetch, decide, compose, and send to completion before the
//! next fetch, so each inbound message is answered at most once. A missed
//! send is logged and never replayed. Shutdown is checked only at the top
//! of the loop, never mid-cycle.

use crate::compose;
use crate::config::Probabilities;
use crate::content::FileContentSource;
use crate::engine;
use crate::groupme::{GroupmeClient, InboundMessage, SenderKind};
use crate::members::MemberDirectory;
use crate::random::ThreadDraw;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PREVIEW_CHARS: usize = 100;

/// Ensures each inbound message is acted on at most once. Tracks the last
/// id handled, plus the last text as a guard against the platform serving
/// the same content under a new id.
#[derive(Debug, Default)]
pub struct DedupTracker {
    last_seen_id: Option<String>,
    last_seen_text: Option<String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `message` is new; records it as seen.
    pub fn accept(&mut self, message: &InboundMessage) -> bool {
        if self.last_seen_id.as_deref() == Some(message.id.as_str()) {
            return false;
        }
        if self.last_seen_text.is_some() && self.last_seen_text == message.text {
            log::debug!("message {} repeats the previous text, skipping", message.id);
            return false;
        }
        self.last_seen_id = Some(message.id.clone());
        self.last_seen_text = message.text.clone();
        true
    }
}

/// The running bot: GroupMe client plus the state owned by the poll loop.
pub struct Bot {
    client: GroupmeClient,
    content: FileContentSource,
    directory: MemberDirectory,
    probabilities: Probabilities,
    poll_interval: Duration,
    dedup: DedupTracker,
}

impl Bot {
    pub fn new(
        client: GroupmeClient,
        content: FileContentSource,
        directory: MemberDirectory,
        probabilities: Probabilities,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            content,
            directory,
            probabilities,
            poll_interval,
            dedup: DedupTracker::new(),
        }
    }

    /// Poll until `running` goes false. The flag is consulted only between
    /// cycles, so an in-flight decide/compose/send always completes.
    pub async fn run(mut self, running: Arc<AtomicBool>) {
        log::info!(
            "bot started: polling every {}s with {:.1}% response rate",
            self.poll_interval.as_secs(),
            self.probabilities.response_probability * 100.0
        );
        while running.load(Ordering::SeqCst) {
            self.poll_once().await;
            tokio::time::sleep(self.poll_interval).await;
        }
        log::info!("bot stopped");
    }

    /// One full cycle: fetch, dedup, decide, compose, send. Every failure
    /// is logged and ends the cycle; the next poll is the only retry.
    pub async fn poll_once(&mut self) {
        let message = match self.client.fetch_latest().await {
            Ok(Some(m)) => m,
            Ok(None) => return,
            Err(e) => {
                log::warn!("fetching latest message failed: {}", e);
                return;
            }
        };

        if !self.dedup.accept(&message) {
            return;
        }
        if message.sender_type != SenderKind::User {
            log::debug!("ignoring non-user message {}", message.id);
            return;
        }

        log::info!(
            "received message from {}: {}",
            message.name.as_deref().unwrap_or("unknown"),
            preview(message.text.as_deref().unwrap_or(""))
        );

        let mut draw = ThreadDraw;
        let Some(intent) = engine::decide(
            &message,
            &self.probabilities,
            &self.content,
            &mut self.directory,
            &mut draw,
        )
        .await
        else {
            return;
        };

        let mention = match intent.mention_target.as_deref() {
            Some(user_id) => self.directory.resolve(user_id).await,
            None => None,
        };
        let Some(payload) = compose::compose(&intent, mention.as_ref()) else {
            return;
        };

        match self.client.post(&payload).await {
            Ok(()) => log::info!("sent response to message {}", message.id),
            Err(e) => log::warn!("sending response to message {} failed: {}", message.id, e),
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}
