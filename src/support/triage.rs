//! Escalation heuristic for support chat turns.
//!
//! A turn is escalated when any one check fires. There is no scoring; each
//! check is plain case-insensitive substring containment or a length test.

use crate::constants::{COMPLEX_ISSUE_KEYWORDS, ESCALATION_MESSAGE_LEN, UNCERTAINTY_MARKERS};

/// Whether the exchange should be handed to a human.
pub fn evaluate(user_message: &str, assistant_message: &str) -> bool {
    mentions_complex_issue(user_message)
        || signals_uncertainty(assistant_message)
        || is_lengthy(user_message)
}

/// User message names an issue from the complex-issue list.
pub fn mentions_complex_issue(user_message: &str) -> bool {
    contains_any(user_message, COMPLEX_ISSUE_KEYWORDS)
}

/// Assistant reply admits it can't help.
pub fn signals_uncertainty(assistant_message: &str) -> bool {
    contains_any(assistant_message, UNCERTAINTY_MARKERS)
}

/// User message is longer than the escalation threshold (in characters).
pub fn is_lengthy(user_message: &str) -> bool {
    user_message.chars().count() > ESCALATION_MESSAGE_LEN
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|phrase| lower.contains(phrase))
}
