use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::FeedError;
use crate::feed::PostGenerator;
use crate::prompt::{GenerationRequest, PostStyle};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Anything shorter than this is treated as a failed generation rather
/// than a real post.
const MIN_POST_CHARS: usize = 10;

/// One generated feed post. Engagement numbers, avatars and timestamps
/// are display-only and live in the renderer, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub style: PostStyle,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageBody,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the chat-completions generation service.
pub struct GenerationClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GenerationClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("wikifeed/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

impl PostGenerator for GenerationClient {
    fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Execute one generation request. Service errors carry the
    /// human-readable message out of the error envelope; an empty or
    /// implausibly short completion is a soft failure (`Ok(None)`).
    async fn generate(&self, request: &GenerationRequest, seq: u64) -> Result<Option<Post>, FeedError> {
        if !self.has_credential() {
            return Err(FeedError::MissingCredential);
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let resp = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FeedError::Generation(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("API request failed ({status})"));
            return Err(FeedError::Generation(message));
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| FeedError::Generation(e.to_string()))?;

        let text = data
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(normalize_output(&text).map(|text| Post {
            id: mint_id(seq),
            text,
            style: request.style,
        }))
    }
}

/// Trimmed completion text, or `None` when it's too short to be a post.
fn normalize_output(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_POST_CHARS {
        return None;
    }
    Some(trimmed.to_string())
}

fn mint_id(seq: u64) -> String {
    format!("post_{}_{seq}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_or_empty_output_is_a_soft_failure() {
        assert!(normalize_output("").is_none());
        assert!(normalize_output("   \n").is_none());
        assert!(normalize_output("ok 👍").is_none());
        assert_eq!(
            normalize_output("  black holes are wild fr 💀  ").as_deref(),
            Some("black holes are wild fr 💀")
        );
    }

    #[test]
    fn error_envelope_yields_the_service_message() {
        let envelope: ErrorEnvelope =
            serde_json::from_str(r#"{"error": {"message": "Incorrect API key provided"}}"#)
                .unwrap();
        assert_eq!(
            envelope.error.map(|e| e.message).as_deref(),
            Some("Incorrect API key provided")
        );
    }

    #[test]
    fn completion_text_comes_from_the_first_choice() {
        let data: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "first"}},
                            {"message": {"role": "assistant", "content": "second"}}]}"#,
        )
        .unwrap();
        let text = data.choices.into_iter().next().map(|c| c.message.content);
        assert_eq!(text.as_deref(), Some("first"));
    }

    #[test]
    fn ids_are_distinguishable_by_sequence() {
        assert_ne!(mint_id(0), mint_id(1));
    }
}
