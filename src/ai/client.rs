use std::{env, time::Duration};

use anyhow::{anyhow, Context, Result};
use log::{error, warn};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::prompts;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const CHAT_MODEL: &str = "gemini-2.5-pro-preview-05-06";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Shown when no API key is configured.
pub const CONFIG_FALLBACK: &str = "I'm currently unable to assist due to a configuration \
issue. Please make sure the API key is set up correctly. In the meantime, here's a study \
tip: use this time to review your recent notes or practice active recall.";

/// Shown when the user submits a blank message.
pub const EMPTY_PROMPT_REPLY: &str = "I notice your message is empty. Could you share what \
you'd like to learn about or which aspect of your studies you'd like to discuss?";

/// Shown when the request fails or times out.
pub const ERROR_FALLBACK: &str = "While I'm temporarily unable to respond due to an \
unexpected issue, here's a quick study tip: write down everything you remember about your \
current topic, then check it against your notes. Please try your question again in a moment.";

const EMPTY_RESPONSE_REPLY: &str = "I understand your message, but I'm having trouble \
formulating a response. Could you rephrase your question or try again?";

#[derive(Debug, Clone)]
struct ChatTurn {
    role: &'static str,
    text: String,
}

/// Chat client for the tutor. Network failures degrade to canned study tips;
/// the only error a caller sees is "superseded", raised when a newer prompt
/// cancels this one. A cancelled request's late response is discarded and
/// never reaches the chat history.
pub struct TutorClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    history: Mutex<Vec<ChatTurn>>,
    inflight: Mutex<Option<CancellationToken>>,
}

impl TutorClient {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY").ok().filter(|key| !key.is_empty());
        if api_key.is_none() {
            warn!("GEMINI_API_KEY is not set; tutor replies will fall back to canned tips");
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client for the tutor")?;

        Ok(Self {
            http,
            api_key,
            model: CHAT_MODEL.to_string(),
            history: Mutex::new(Vec::new()),
            inflight: Mutex::new(None),
        })
    }

    pub async fn send_prompt(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(EMPTY_PROMPT_REPLY.to_string());
        }
        let Some(api_key) = self.api_key.clone() else {
            return Ok(CONFIG_FALLBACK.to_string());
        };

        // Supersede any request still in flight.
        let token = CancellationToken::new();
        {
            let mut slot = self.inflight.lock().await;
            if let Some(previous) = slot.replace(token.clone()) {
                previous.cancel();
            }
        }

        {
            let mut history = self.history.lock().await;
            history.push(ChatTurn {
                role: "user",
                text: prompt.to_string(),
            });
        }

        let contents = self.conversation_contents().await;

        let result = tokio::select! {
            _ = token.cancelled() => {
                return Err(anyhow!("prompt superseded by a newer request"));
            }
            result = self.request_completion(&api_key, &contents) => result,
        };

        match result {
            Ok(text) if text.trim().is_empty() => Ok(EMPTY_RESPONSE_REPLY.to_string()),
            Ok(text) => {
                if !token.is_cancelled() {
                    self.history.lock().await.push(ChatTurn {
                        role: "model",
                        text: text.clone(),
                    });
                }
                Ok(text)
            }
            Err(err) => {
                error!("Tutor request failed: {err}");
                Ok(ERROR_FALLBACK.to_string())
            }
        }
    }

    /// System prompt as the opening user turn, then the conversation so far.
    async fn conversation_contents(&self) -> Vec<Value> {
        let history = self.history.lock().await;
        let mut contents = Vec::with_capacity(history.len() + 1);
        contents.push(json!({
            "role": "user",
            "parts": [{ "text": prompts::SYSTEM_PROMPT }],
        }));
        for turn in history.iter() {
            contents.push(json!({
                "role": turn.role,
                "parts": [{ "text": turn.text }],
            }));
        }
        contents
    }

    async fn request_completion(&self, api_key: &str, contents: &[Value]) -> Result<String> {
        let url = format!("{GEMINI_BASE_URL}/{}:generateContent", self.model);
        let body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": 0.7,
                "topP": 0.8,
                "topK": 40,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            },
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .context("generateContent request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("generateContent returned {status}: {detail}"));
        }

        let payload: Value = response
            .json()
            .await
            .context("generateContent response was not JSON")?;
        Ok(extract_text(&payload))
    }
}

fn extract_text(payload: &Value) -> String {
    let Some(parts) = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    else {
        return String::new();
    };

    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_concatenates_candidate_parts() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Start with a 25-minute session. " },
                        { "text": "Then take a 5-minute break." }
                    ]
                }
            }]
        });
        assert_eq!(
            extract_text(&payload),
            "Start with a 25-minute session. Then take a 5-minute break."
        );
    }

    #[test]
    fn extract_handles_missing_candidates() {
        assert_eq!(extract_text(&json!({})), "");
        assert_eq!(extract_text(&json!({ "candidates": [] })), "");
    }

    #[tokio::test]
    async fn missing_api_key_degrades_to_config_fallback() {
        let client = TutorClient {
            http: reqwest::Client::new(),
            api_key: None,
            model: CHAT_MODEL.to_string(),
            history: Mutex::new(Vec::new()),
            inflight: Mutex::new(None),
        };
        let reply = client.send_prompt("How do I study better?").await.unwrap();
        assert_eq!(reply, CONFIG_FALLBACK);
    }

    #[tokio::test]
    async fn blank_prompt_short_circuits() {
        let client = TutorClient {
            http: reqwest::Client::new(),
            api_key: Some("test-key".to_string()),
            model: CHAT_MODEL.to_string(),
            history: Mutex::new(Vec::new()),
            inflight: Mutex::new(None),
        };
        let reply = client.send_prompt("   ").await.unwrap();
        assert_eq!(reply, EMPTY_PROMPT_REPLY);
        assert!(client.history.lock().await.is_empty());
    }
}
