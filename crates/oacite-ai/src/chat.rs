//! OpenAI-compatible chat-completion client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::oracle::{Oracle, OracleError};

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Oracle calls get more time than other requests; long segments are slow.
const ORACLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completion client with temperature pinned to zero.
pub struct ChatCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionClient {
    /// Create a client that shares `client` (and its proxy settings).
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn request_body<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        }
    }
}

/// Pull the first completion's text out of a response body.
fn completion_text(body: &str) -> Result<String, OracleError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(OracleError::EmptyResponse)
}

#[async_trait::async_trait]
impl Oracle for ChatCompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError> {
        info!(model = %self.model, chars = user.chars().count(), "calling oracle");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(ORACLE_TIMEOUT)
            .json(&self.request_body(system, user))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(OracleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = completion_text(&body)?;
        debug!(reply = %text, "oracle replied");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_pins_temperature_and_roles() {
        let client = ChatCompletionClient::new(reqwest::Client::new(), "sk-test".into())
            .with_model("test-model");
        let body = serde_json::to_value(client.request_body("rules", "segment")).unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "rules");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "segment");
    }

    #[test]
    fn defaults() {
        let client = ChatCompletionClient::new(reqwest::Client::new(), "k".into());
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.endpoint, DEFAULT_CHAT_ENDPOINT);
        let client = client.with_endpoint("http://localhost:8080/v1/chat/completions");
        assert_eq!(client.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn completion_text_reads_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "JP2014178928A\nWO2017018016"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        assert_eq!(
            completion_text(body).unwrap(),
            "JP2014178928A\nWO2017018016"
        );
    }

    #[test]
    fn completion_text_without_choices_is_empty_response() {
        assert!(matches!(
            completion_text(r#"{"choices": []}"#),
            Err(OracleError::EmptyResponse)
        ));
        assert!(matches!(
            completion_text(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#),
            Err(OracleError::EmptyResponse)
        ));
    }

    #[test]
    fn completion_text_rejects_malformed_json() {
        assert!(matches!(
            completion_text("<html>bad gateway</html>"),
            Err(OracleError::Json(_))
        ));
    }
}
