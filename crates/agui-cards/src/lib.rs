//! Presentational cards for AG-UI tool calls.
//!
//! Each tool the assistant can call has a card that turns its loosely-typed result (plain
//! text, JSON text or a JSON object) into a fixed shape. Parsing never fails loudly: a result
//! that does not fit shows up as raw text instead.

pub mod a2a;
pub mod calculator;
mod card;
pub mod catalog;
pub mod clock;
pub mod frontend;
pub mod payload;
pub mod preferences;
pub mod quote;
mod status;
pub mod weather;

pub use card::Card;
pub use preferences::{AgentPreferences, Language, ReplyStyle};
pub use status::{CardView, ToolStatus};

/// Longest text a one-line card summary carries.
pub const SUMMARY_CHARS: usize = 120;

pub(crate) fn truncate(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
