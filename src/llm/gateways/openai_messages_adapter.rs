//! Adapter between harness messages and the OpenAI chat-completions wire format.

use crate::error::Result;
use crate::llm::models::{LlmMessage, LlmToolCall, MessageRole};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;

/// Adapt LLM messages to OpenAI format.
pub fn adapt_messages_to_openai(messages: &[LlmMessage]) -> Result<Vec<Value>> {
    let mut result = Vec::with_capacity(messages.len());

    for msg in messages {
        let openai_msg = match msg.role {
            MessageRole::System => json!({
                "role": "system",
                "content": msg.content.as_deref().unwrap_or("")
            }),
            MessageRole::User => json!({
                "role": "user",
                "content": msg.content.as_deref().unwrap_or("")
            }),
            MessageRole::Assistant => {
                let mut assistant_msg = json!({
                    "role": "assistant",
                    "content": msg.content
                });

                if let Some(ref tool_calls) = msg.tool_calls {
                    let formatted_calls = tool_calls
                        .iter()
                        .map(|tc| {
                            Ok(json!({
                                "id": tc.id.as_deref().unwrap_or(""),
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": serde_json::to_string(&tc.arguments)?
                                }
                            }))
                        })
                        .collect::<Result<Vec<Value>>>()?;
                    assistant_msg["tool_calls"] = Value::Array(formatted_calls);
                }

                assistant_msg
            }
            MessageRole::Tool => {
                if msg.tool_call_id.is_none() {
                    warn!("Tool message without tool_call_id");
                }
                json!({
                    "role": "tool",
                    "content": msg.content.as_deref().unwrap_or(""),
                    "tool_call_id": msg.tool_call_id.as_deref().unwrap_or("")
                })
            }
        };

        result.push(openai_msg);
    }

    Ok(result)
}

/// Convert tool calls from OpenAI format to internal format.
///
/// Entries without a function name are dropped. Arguments that are not a JSON object
/// become an empty map.
pub fn convert_tool_calls(tool_calls: &[Value]) -> Vec<LlmToolCall> {
    tool_calls
        .iter()
        .filter_map(|tc| {
            let id = tc["id"].as_str().map(String::from);
            let name = tc["function"]["name"].as_str()?.to_string();
            let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");

            let arguments: HashMap<String, Value> = serde_json::from_str(args_str)
                .unwrap_or_else(|e| {
                    warn!(tool = %name, error = %e, "Unparseable tool call arguments");
                    HashMap::new()
                });

            Some(LlmToolCall {
                id,
                name,
                arguments,
            })
        })
        .collect()
}
