use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Client for an OpenAI-compatible chat completion endpoint.
///
/// Built once per process and shared by reference. Absence of credentials
/// is not an error: `from_env` simply returns `None` and every consumer
/// falls back to its deterministic path.
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    provider: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl ChatClient {
    pub fn new(
        provider: &'static str,
        base_url: impl Into<String>,
        api_key: String,
        model: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
            provider,
        })
    }

    /// Probe the supported providers in priority order and build a client
    /// for the first one with credentials present.
    pub fn from_env() -> Option<Self> {
        if let (Ok(key), Ok(base)) = (
            env::var("OPENAI_PROXY_API_KEY"),
            env::var("OPENAI_PROXY_BASE"),
        ) {
            let model = env::var("OPENAI_PROXY_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string());
            match Self::new("openai_proxy", base, key, model) {
                Ok(client) => {
                    tracing::info!(provider = client.provider, model = %client.model, "chat client ready");
                    return Some(client);
                }
                Err(e) => tracing::warn!(error = %e, "openai proxy client init failed"),
            }
        }

        if let Ok(key) = env::var("SILICONFLOW_API_KEY") {
            let model = env::var("SILICONFLOW_MODEL")
                .unwrap_or_else(|_| "Qwen/Qwen2.5-72B-Instruct".to_string());
            match Self::new("siliconflow", "https://api.siliconflow.cn/v1", key, model) {
                Ok(client) => {
                    tracing::info!(provider = client.provider, model = %client.model, "chat client ready");
                    return Some(client);
                }
                Err(e) => tracing::warn!(error = %e, "siliconflow client init failed"),
            }
        }

        tracing::warn!("no chat completion credentials found, AI features disabled");
        None
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Send one user message and return the raw response text.
    ///
    /// A single attempt: failures are reported to the caller, which owns
    /// the fallback.
    pub async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Chat API error: {} - {}", status, error_text);
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse chat completion response")?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            anyhow::bail!("Chat API returned no content");
        }

        Ok(content)
    }
}

/// Extract a well-formed JSON object from an arbitrary text envelope.
///
/// Chat models often wrap JSON payloads in markdown code fences or add
/// prose around them. This strips a leading/trailing fence and then
/// narrows to the outermost `{...}` span. Returns the input unchanged
/// when no braces are found.
pub fn extract_json(text: &str) -> &str {
    let mut trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        trimmed = rest;
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest;
    }
    if let Some(rest) = trimmed.strip_suffix("```") {
        trimmed = rest;
    }
    trimmed = trimmed.trim();

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_passes_through_plain_object() {
        assert_eq!(extract_json(r#"{"ideas": []}"#), r#"{"ideas": []}"#);
    }

    #[test]
    fn extract_json_strips_json_fence() {
        let text = "```json\n{\"ideas\": [1]}\n```";
        assert_eq!(extract_json(text), "{\"ideas\": [1]}");
    }

    #[test]
    fn extract_json_strips_bare_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn extract_json_narrows_to_braces_inside_prose() {
        let text = "Here is the result:\n{\"a\": {\"b\": 2}}\nHope this helps!";
        assert_eq!(extract_json(text), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn extract_json_handles_multibyte_prose() {
        let text = "以下是结果：{\"name\": \"工具\"} 谢谢";
        assert_eq!(extract_json(text), "{\"name\": \"工具\"}");
    }

    #[test]
    fn extract_json_without_braces_returns_trimmed_input() {
        assert_eq!(extract_json("  no json here  "), "no json here");
    }
}
