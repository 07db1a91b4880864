use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::constants::*;

use super::conversation::{build_request, ChatReply, ChatTurn};
use super::triage;

/// Why a support request produced no reply.
#[derive(Debug, Error)]
pub enum SupportError {
    /// No API key was found; no request was attempted.
    #[error("support chat is not configured (set {})", AI_API_KEY_ENV)]
    NotConfigured,
    /// The provider call failed (network, auth, rate limit, bad response).
    #[error("failed to process chat message, please try again later: {0}")]
    ProviderUnavailable(String),
}

/// Async client for an OpenAI-compatible chat completion endpoint.
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(api_key: String, config: &AiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Try to discover the API key from the environment (including anything
    /// loaded from the .env file).
    pub fn discover_api_key() -> Option<String> {
        std::env::var(AI_API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Send `messages` and return the first completion's content, or the
    /// fixed fallback reply when the provider returns none.
    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<String, SupportError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(model = %self.model, turns = messages.len(), "sending chat completion");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                SupportError::ProviderUnavailable(format!(
                    "failed to connect to chat provider: {}",
                    e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let err_msg = match status.as_u16() {
                401 => "authentication failed (401), check the API key".to_string(),
                403 => "access forbidden (403)".to_string(),
                429 => "rate limited (429)".to_string(),
                _ => format!(
                    "API error {}: {}",
                    status,
                    crate::utils::truncate_str(&body_text, PROVIDER_ERROR_BODY_LEN)
                ),
            };
            warn!(%status, "chat provider returned an error");
            return Err(SupportError::ProviderUnavailable(err_msg));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            SupportError::ProviderUnavailable(format!("malformed provider response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| CHAT_FALLBACK_REPLY.to_string());
        Ok(content)
    }
}

// ── ChatProvider ──────────────────────────────────────────────────

/// The support provider, either ready to call or missing its credential.
pub enum ChatProvider {
    Unconfigured,
    Ready(ChatClient),
}

impl ChatProvider {
    /// Ready if an API key can be discovered, otherwise unconfigured.
    pub fn from_config(config: &AiConfig) -> Self {
        match ChatClient::discover_api_key() {
            Some(key) => ChatProvider::Ready(ChatClient::new(key, config)),
            None => ChatProvider::Unconfigured,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ChatProvider::Ready(_))
    }

    /// Answer `message` given the prior turns, and decide whether the
    /// exchange needs a human.
    pub async fn process_chat_message(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<ChatReply, SupportError> {
        let ChatProvider::Ready(client) = self else {
            return Err(SupportError::NotConfigured);
        };

        let messages = build_request(SUPPORT_SYSTEM_PROMPT, history, message);
        let reply = client.complete(&messages).await?;
        let should_escalate = triage::evaluate(message, &reply);
        debug!(should_escalate, "support turn triaged");
        Ok(ChatReply {
            message: reply,
            should_escalate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> ChatProvider {
        let config = AiConfig {
            base_url: format!("{}/v1", server.uri()),
            ..AiConfig::default()
        };
        ChatProvider::Ready(ChatClient::new("test-key".to_string(), &config))
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    #[test]
    fn unconfigured_is_not_ready() {
        assert!(!ChatProvider::Unconfigured.is_ready());
    }

    #[tokio::test]
    async fn unconfigured_fails_without_calling() {
        let err = ChatProvider::Unconfigured
            .process_chat_message("hello", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SupportError::NotConfigured));
    }

    #[tokio::test]
    async fn reply_is_returned_and_triaged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": DEFAULT_AI_MODEL,
                "max_tokens": DEFAULT_AI_MAX_TOKENS,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "Open settings and switch the proxy method to stealth.",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        assert!(provider.is_ready());
        let reply = provider
            .process_chat_message("Which proxy mode should I use?", &[])
            .await
            .unwrap();
        assert_eq!(
            reply.message,
            "Open settings and switch the proxy method to stealth."
        );
        assert!(!reply.should_escalate);
    }

    #[tokio::test]
    async fn request_carries_system_history_and_user_turns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": SUPPORT_SYSTEM_PROMPT },
                    { "role": "user", "content": "earlier" },
                    { "role": "assistant", "content": "earlier answer" },
                    { "role": "user", "content": "I was hacked" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion("Sorry to hear that.")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![
            ChatTurn::user("earlier"),
            ChatTurn::assistant("earlier answer"),
        ];
        let reply = provider_for(&server)
            .process_chat_message("I was hacked", &history)
            .await
            .unwrap();
        assert!(reply.should_escalate);
    }

    #[tokio::test]
    async fn empty_choices_use_fallback_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let reply = provider_for(&server)
            .process_chat_message("hello", &[])
            .await
            .unwrap();
        assert_eq!(reply.message, CHAT_FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn null_content_uses_fallback_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [ { "message": { "role": "assistant", "content": null } } ]
            })))
            .mount(&server)
            .await;

        let reply = provider_for(&server)
            .process_chat_message("hello", &[])
            .await
            .unwrap();
        assert_eq!(reply.message, CHAT_FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn server_error_is_provider_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .process_chat_message("hello", &[])
            .await
            .unwrap_err();
        match err {
            SupportError::ProviderUnavailable(msg) => assert!(msg.contains("upstream exploded")),
            other => panic!("expected ProviderUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_is_provider_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .process_chat_message("hello", &[])
            .await
            .unwrap_err();
        match err {
            SupportError::ProviderUnavailable(msg) => assert!(msg.contains("429")),
            other => panic!("expected ProviderUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_provider_unavailable() {
        let config = AiConfig {
            // Port 9 (discard) on localhost; nothing should be listening.
            base_url: "http://127.0.0.1:9/v1".to_string(),
            ..AiConfig::default()
        };
        let provider = ChatProvider::Ready(ChatClient::new("k".to_string(), &config));
        let err = provider.process_chat_message("hello", &[]).await.unwrap_err();
        assert!(matches!(err, SupportError::ProviderUnavailable(_)));
    }
}
