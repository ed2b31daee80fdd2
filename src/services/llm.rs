//! Chat-completions client for OpenAI-compatible endpoints.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{AppError, AppResult, ResultExt};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct LlmService {
    client: Client,
}

impl LlmService {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Issues one completion constrained to `schema` and returns the raw
    /// JSON text of the first choice.
    pub async fn generate_structured_json(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> AppResult<String> {
        let request = ChatRequest {
            model: &provider.model,
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: Some(ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: schema_name,
                    strict: true,
                    schema,
                },
            }),
        };

        self.complete(provider, &request).await
    }

    /// Issues one free-text completion and returns the trimmed text.
    pub async fn generate_text(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
    ) -> AppResult<String> {
        let request = ChatRequest {
            model: &provider.model,
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: None,
        };

        let text = self.complete(provider, &request).await?;
        Ok(text.trim().to_string())
    }

    async fn complete(
        &self,
        provider: &ProviderConfig,
        request: &ChatRequest<'_>,
    ) -> AppResult<String> {
        let api_key = provider.api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::Config("missing api key".to_string()));
        }

        let url = format!(
            "{}/chat/completions",
            build_base_url(provider.base_url.as_deref())
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .llm_err("chat request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::LlmService(format!(
                "chat request failed: {status} {body}"
            )));
        }

        let response: ChatResponse = response.json().await.llm_err("chat response invalid")?;

        let output = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if output.trim().is_empty() {
            return Err(AppError::LlmService(
                "chat response missing text".to_string(),
            ));
        }

        Ok(output)
    }
}

fn build_base_url(base_url: Option<&str>) -> String {
    let base = base_url
        .unwrap_or(DEFAULT_BASE_URL)
        .trim()
        .trim_end_matches('/');
    if base.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        base.to_string()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn structured_request_carries_strict_schema_format() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: "generate a listing",
            }],
            response_format: Some(ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "house_listing",
                    strict: true,
                    schema: json!({ "type": "object" }),
                },
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["name"], "house_listing");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn free_text_request_omits_response_format() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: "rewrite this listing",
            }],
            response_format: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn base_url_falls_back_and_strips_trailing_slash() {
        assert_eq!(build_base_url(None), DEFAULT_BASE_URL);
        assert_eq!(build_base_url(Some("  ")), DEFAULT_BASE_URL);
        assert_eq!(
            build_base_url(Some("https://proxy.internal/v1/")),
            "https://proxy.internal/v1"
        );
    }
}
