//! Incremental synchronization against the remote chat feed
//!
//! One cursor, one poller, never two polls in flight. The cursor is the
//! `createdAt` of the newest message seen; the feed's own ordering is
//! trusted and nothing is de-duplicated by identity, so a feed that repeats
//! a boundary-timestamp message gets it delivered again (at-least-once).

use crate::feed::FeedClient;
use crate::message::FeedMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Idle,
    Fetching,
}

pub struct ChatSyncPoller {
    feed: FeedClient,
    last_message_timestamp: i64,
    state: PollState,
}

impl ChatSyncPoller {
    pub fn new(feed: FeedClient) -> Self {
        Self {
            feed,
            last_message_timestamp: 0,
            state: PollState::Idle,
        }
    }

    /// The newest `createdAt` already delivered; 0 before the first read.
    pub fn cursor(&self) -> i64 {
        self.last_message_timestamp
    }

    /// One poll cycle: fetch everything newer than the cursor, advance the
    /// cursor to the last message returned, and hand the batch back for
    /// delivery. A tick that lands while a poll is already in flight is
    /// skipped entirely. Failures leave the cursor untouched and read as
    /// "no new messages"; the next tick retries.
    pub fn poll(&mut self) -> Vec<FeedMessage> {
        if self.state == PollState::Fetching {
            tracing::debug!("poll tick skipped, fetch already in flight");
            return Vec::new();
        }

        self.state = PollState::Fetching;
        let delivered = match self.feed.fetch_since(self.last_message_timestamp) {
            Ok(messages) => self.advance(messages),
            Err(err) => {
                tracing::warn!(error = %err, "feed poll failed");
                Vec::new()
            }
        };
        self.state = PollState::Idle;

        delivered
    }

    /// One-shot outbound send, independent of the poll cycle. A successful
    /// response may carry new messages; those advance sync state exactly
    /// like a poll result.
    pub fn send(&mut self, nickname: &str, message: &str) -> Vec<FeedMessage> {
        match self.feed.send(nickname, message) {
            Ok(messages) => self.advance(messages),
            Err(err) => {
                tracing::warn!(error = %err, "feed send failed");
                Vec::new()
            }
        }
    }

    fn advance(&mut self, messages: Vec<FeedMessage>) -> Vec<FeedMessage> {
        if let Some(last) = messages.last() {
            self.last_message_timestamp = last.created_at;
        }
        messages
    }
}
