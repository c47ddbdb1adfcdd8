//! OpenAI-compatible gateway for LLM interactions.
//!
//! Talks to any server implementing the `/chat/completions` endpoint, which covers
//! OpenAI itself and most local inference servers.

use crate::config::LlmConfig;
use crate::error::{HarnessError, Result};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::gateways::openai_messages_adapter::{adapt_messages_to_openai, convert_tool_calls};
use crate::llm::models::{LlmGatewayResponse, LlmMessage};
use crate::llm::tools::ToolDescriptor;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Configuration for connecting to an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
    pub timeout: Option<std::time::Duration>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            headers: HashMap::new(),
            timeout: None,
        }
    }
}

impl From<&LlmConfig> for OpenAIConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            headers: config.headers.clone(),
            timeout: config.timeout,
        }
    }
}

/// Gateway for OpenAI-compatible chat completion services.
pub struct OpenAIGateway {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIGateway {
    /// Create a new gateway with custom configuration.
    ///
    /// Fails when an extra header name or value is not valid HTTP.
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let mut client_builder = Client::builder().default_headers(default_headers(&config)?);

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build()?;

        Ok(Self { client, config })
    }

    /// Create gateway with custom API key and base URL.
    pub fn with_api_key_and_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Self::with_config(OpenAIConfig {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

fn default_headers(config: &OpenAIConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            HarnessError::ConfigError(format!("invalid header name '{}': {}", name, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            HarnessError::ConfigError(format!("invalid value for header '{}': {}", name, e))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl LlmGateway for OpenAIGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        info!("Delegating to OpenAI for completion");
        debug!("Model: {}, Message count: {}", model, messages.len());

        let openai_messages = adapt_messages_to_openai(messages)?;

        let mut body = serde_json::json!({
            "model": model,
            "messages": openai_messages,
            "temperature": config.temperature,
        });

        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools)?;
        }

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(HarnessError::GatewayError(format!(
                "OpenAI API error: {} - {}",
                status, error_text
            )));
        }

        let response_body: Value = response.json().await?;
        let message = &response_body["choices"][0]["message"];
        if message.is_null() {
            return Err(HarnessError::GatewayError("No message in response".to_string()));
        }

        let content = message["content"].as_str().map(String::from);

        let tool_calls = match message["tool_calls"].as_array() {
            Some(calls) => convert_tool_calls(calls),
            None => vec![],
        };

        debug!(tool_calls = tool_calls.len(), "Completion received");

        Ok(LlmGatewayResponse {
            content,
            tool_calls,
        })
    }
}
