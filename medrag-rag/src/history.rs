//! Conversation history: turns, truncation, and transcript linearization.

use serde::{Deserialize, Serialize};

/// One completed user/bot exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// What the user said.
    pub user: String,
    /// What the bot replied.
    pub bot: String,
}

impl ConversationTurn {
    /// Create a turn.
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self { user: user.into(), bot: bot.into() }
    }
}

/// Linearize the most recent `max_turns` of `history` plus the pending
/// `message` into a flat transcript ending with an open `Bot:` cue.
///
/// Turns are chronological; truncation drops the oldest turns.
pub fn transcript(history: &[ConversationTurn], message: &str, max_turns: usize) -> String {
    let start = history.len().saturating_sub(max_turns);
    let mut out = String::new();
    for turn in &history[start..] {
        out.push_str(&format!("User: {}\nBot: {}\n", turn.user, turn.bot));
    }
    out.push_str(&format!("User: {message}\nBot:"));
    out
}
