//! Support chat: a thin wrapper over a chat completion provider plus the
//! escalation heuristic applied to each turn.

mod client;
mod conversation;
pub mod triage;

pub use client::{ChatProvider, SupportError};
