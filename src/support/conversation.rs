use serde::{Deserialize, Serialize};

/// Role of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// A single message exchanged with the support provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: &str) -> Self {
        Self {
            role: ChatRole::User,
            content: content.to_string(),
        }
    }

    #[allow(dead_code)]
    pub fn assistant(content: &str) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.to_string(),
        }
    }

    pub fn system(content: &str) -> Self {
        Self {
            role: ChatRole::System,
            content: content.to_string(),
        }
    }
}

/// Provider answer plus the triage decision for that turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub message: String,
    pub should_escalate: bool,
}

/// Message list for one request: the synthesized system turn, the prior
/// turns, then the new user turn.
///
/// System turns in `history` are dropped; only the synthesized prompt
/// speaks for the system.
pub fn build_request(
    system_prompt: &str,
    history: &[ChatTurn],
    user_message: &str,
) -> Vec<ChatTurn> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatTurn::system(system_prompt));
    messages.extend(
        history
            .iter()
            .filter(|turn| turn.role != ChatRole::System)
            .cloned(),
    );
    messages.push(ChatTurn::user(user_message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Turn constructors ─────────────────────────────────────────

    #[test]
    fn turn_user() {
        let t = ChatTurn::user("hello");
        assert_eq!(t.role, ChatRole::User);
        assert_eq!(t.content, "hello");
    }

    #[test]
    fn turn_assistant() {
        let t = ChatTurn::assistant("hi there");
        assert_eq!(t.role, ChatRole::Assistant);
        assert_eq!(t.content, "hi there");
    }

    #[test]
    fn turn_system() {
        let t = ChatTurn::system("context");
        assert_eq!(t.role, ChatRole::System);
    }

    #[test]
    fn turn_serializes_api_format() {
        let json = serde_json::to_value(ChatTurn::assistant("ok")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "ok");
    }

    // ── build_request ─────────────────────────────────────────────

    #[test]
    fn request_wraps_history_with_system_and_user() {
        let history = vec![ChatTurn::user("first"), ChatTurn::assistant("answer")];
        let messages = build_request("be helpful", &history, "second");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatTurn::system("be helpful"));
        assert_eq!(messages[1].content, "first");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[3], ChatTurn::user("second"));
    }

    #[test]
    fn request_drops_prior_system_turns() {
        let history = vec![ChatTurn::system("stale"), ChatTurn::user("q")];
        let messages = build_request("fresh", &history, "next");
        let systems: Vec<_> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .collect();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].content, "fresh");
    }

    #[test]
    fn request_with_empty_history() {
        let messages = build_request("sys", &[], "hi");
        assert_eq!(messages, vec![ChatTurn::system("sys"), ChatTurn::user("hi")]);
    }
}
