//! Per-user rolling conversation transcripts.
//!
//! Transcripts are stored around each AI exchange but are not fed back
//! into provider requests; they bound the context a future prompt could
//! carry and expire an hour after the last write.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Most recent turns kept per user.
const MAX_TURNS: usize = 10;

/// A transcript is deleted this long after its last write.
const EXPIRY: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

struct History {
    turns: Vec<Turn>,
    last_write: Instant,
}

impl History {
    fn push(&mut self, role: Role, content: String, now: Instant) {
        self.turns.push(Turn { role, content });
        if self.turns.len() > MAX_TURNS {
            let excess = self.turns.len() - MAX_TURNS;
            self.turns.drain(..excess);
        }
        self.last_write = now;
    }
}

/// Short rolling transcript per user, keyed by sender number.
pub struct ConversationMemory {
    histories: HashMap<String, History>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
        }
    }

    /// Append one turn to a user's transcript, creating it on first use.
    /// Every write pushes the expiry forward.
    pub fn record(&mut self, user: &str, role: Role, content: &str, now: Instant) {
        match self.histories.get_mut(user) {
            Some(history) => history.push(role, content.to_string(), now),
            None => {
                let mut history = History { turns: Vec::new(), last_write: now };
                history.push(role, content.to_string(), now);
                self.histories.insert(user.to_string(), history);
            }
        }
    }

    pub fn turns(&self, user: &str) -> Option<&[Turn]> {
        self.histories.get(user).map(|h| h.turns.as_slice())
    }

    /// Delete transcripts whose last write is older than the expiry.
    /// Called periodically instead of arming a timer per transcript.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.histories.len();
        self.histories
            .retain(|_, h| now.duration_since(h.last_write) < EXPIRY);
        before - self.histories.len()
    }

    pub fn user_count(&self) -> usize {
        self.histories.len()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}
