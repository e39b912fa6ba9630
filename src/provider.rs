use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const CONNECT_TIMEOUT_SECS: u64 = 5;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide client. Request timeouts are set per provider call.
fn shared_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("matchday_oracle/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A text completion service. Implementations decide transport and vendor.
pub trait ReasoningProvider: Send + Sync {
    fn complete(&self, messages: &[ChatMessage], temperature: f32, max_tokens: u32)
    -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Speaks the OpenAI-style `/chat/completions` protocol.
pub struct ChatCompletionsProvider {
    settings: ProviderSettings,
}

impl ChatCompletionsProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ReasoningProvider for ChatCompletionsProvider {
    fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let client = shared_client()?;
        let body = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature,
            max_tokens,
        };

        let resp = client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.settings.timeout)
            .json(&body)
            .send()
            .context("chat completion request failed")?;
        let status = resp.status();
        let text = resp.text().context("failed reading chat completion body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, truncate(&text, 200)));
        }

        parse_chat_response(&text)
    }
}

pub fn parse_chat_response(raw: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(raw).context("invalid chat completion json")?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("chat completion returned no content"))?;
    Ok(content)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice_content() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  {\"homeWin\":50}  "}}]}"#;
        assert_eq!(parse_chat_response(raw).unwrap(), r#"{"homeWin":50}"#);
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(parse_chat_response(r#"{"choices":[]}"#).is_err());
        assert!(parse_chat_response(r#"{"choices":[{"message":{"content":"  "}}]}"#).is_err());
        assert!(parse_chat_response(r#"{"choices":[{"message":{"content":null}}]}"#).is_err());
        assert!(parse_chat_response("<html>").is_err());
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let p = ChatCompletionsProvider::new(ProviderSettings {
            api_key: "k".to_string(),
            base_url: "https://api.example.com/v1/".to_string(),
            model: "m".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert_eq!(p.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
