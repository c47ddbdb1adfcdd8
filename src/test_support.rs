//! Gateways and tools shared by unit tests

use crate::error::{HarnessError, Result};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmGatewayResponse, LlmMessage, LlmToolCall, MessageRole};
use crate::llm::tools::{LlmTool, ToolDescriptor};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub enum Scripted {
    Reply(LlmGatewayResponse),
    Fail(String),
}

pub fn text(content: &str) -> Scripted {
    Scripted::Reply(LlmGatewayResponse {
        content: Some(content.to_string()),
        tool_calls: vec![],
    })
}

pub fn failure(message: &str) -> Scripted {
    Scripted::Fail(message.to_string())
}

pub fn tool_call(id: &str, name: &str, args: Value) -> LlmToolCall {
    LlmToolCall {
        id: Some(id.to_string()),
        name: name.to_string(),
        arguments: serde_json::from_value(args).unwrap_or_default(),
    }
}

pub fn calls(tool_calls: Vec<LlmToolCall>) -> Scripted {
    Scripted::Reply(LlmGatewayResponse {
        content: None,
        tool_calls,
    })
}

/// Replays a fixed list of replies and remembers every message list it was sent
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Vec<LlmMessage>>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Vec<LlmMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(
        &self,
        _model: &str,
        messages: &[LlmMessage],
        _tools: &[ToolDescriptor],
        _config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(HarnessError::GatewayError(message)),
            None => Err(HarnessError::GatewayError("script exhausted".to_string())),
        }
    }
}

/// Answers from the conversation itself, so any number of sessions can share it
///
/// - last message from a tool: summarise the tool result
/// - last user message asking about the weather "in <place>": call `get_weather`
/// - anything else: echo the question back
pub struct WeatherRuleGateway;

#[async_trait::async_trait]
impl LlmGateway for WeatherRuleGateway {
    async fn complete(
        &self,
        _model: &str,
        messages: &[LlmMessage],
        _tools: &[ToolDescriptor],
        _config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        tokio::task::yield_now().await;

        let last = messages
            .last()
            .ok_or_else(|| HarnessError::GatewayError("empty conversation".to_string()))?;
        let content = last.content.clone().unwrap_or_default();

        if last.role == MessageRole::Tool {
            return Ok(LlmGatewayResponse {
                content: Some(format!("Forecast: {}", content)),
                tool_calls: vec![],
            });
        }

        let lower = content.to_lowercase();
        if let (true, Some(idx)) = (lower.contains("weather"), lower.rfind(" in ")) {
            let place = content[idx + " in ".len()..].trim_end_matches('?').trim();
            let call_id = format!("call_{}", messages.len());
            return Ok(LlmGatewayResponse {
                content: None,
                tool_calls: vec![tool_call(&call_id, "get_weather", json!({"location": place}))],
            });
        }

        Ok(LlmGatewayResponse {
            content: Some(format!("You asked: {}", content)),
            tool_calls: vec![],
        })
    }
}

/// Returns its `text` argument
pub struct EchoTool;

impl LlmTool for EchoTool {
    fn run(&self, args: &HashMap<String, Value>) -> Result<Value> {
        Ok(args.get("text").cloned().unwrap_or(Value::Null))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function("echo", "Echo the text argument", json!({"type": "object"}))
    }
}

pub struct FailingTool;

impl LlmTool for FailingTool {
    fn run(&self, _args: &HashMap<String, Value>) -> Result<Value> {
        Err(HarnessError::ToolError("always fails".to_string()))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function("fail", "Always fails", json!({"type": "object"}))
    }
}
