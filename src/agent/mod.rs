//! Tool-calling agent loop
//!
//! [`Agent::invoke`] alternates model calls and tool calls until the model answers without
//! requesting a tool. Every call goes through the registered [`AgentMiddleware`] stack,
//! which is where tracing attaches.

pub mod context;
pub mod middleware;

pub use context::InvocationContext;
pub use middleware::{AgentMiddleware, ModelNext, ModelRequest, ToolCallRequest, ToolNext};

use crate::error::{HarnessError, Result};
use crate::llm::broker::LlmBroker;
use crate::llm::models::LlmMessage;
use crate::llm::tools::{LlmTool, ToolDescriptor};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound on model calls within one invocation
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

/// A model, its tools and the middleware observing them
///
/// The agent holds no per-invocation state, so one instance can serve any number of
/// concurrent invocations.
pub struct Agent {
    broker: LlmBroker,
    tools: Vec<Arc<dyn LlmTool>>,
    middleware: Vec<Arc<dyn AgentMiddleware>>,
    system_prompt: Option<String>,
    max_iterations: usize,
}

impl Agent {
    pub fn builder(broker: LlmBroker) -> AgentBuilder {
        AgentBuilder::new(broker)
    }

    pub fn model(&self) -> &str {
        self.broker.model()
    }

    /// Run the conversation forward from `messages`.
    ///
    /// Returns the input history followed by every assistant and tool message produced
    /// during this invocation. The system prompt is not part of the returned history.
    /// A failed model or tool call ends the invocation with that call's error.
    pub async fn invoke(
        &self,
        messages: Vec<LlmMessage>,
        context: InvocationContext,
    ) -> Result<Vec<LlmMessage>> {
        let chat_id = context.require_chat_id()?.to_string();
        let descriptors: Vec<ToolDescriptor> = self.tools.iter().map(|t| t.descriptor()).collect();
        let mut messages = messages;

        for iteration in 1..=self.max_iterations {
            debug!(chat_id = %chat_id, iteration, "Calling model");

            let request = ModelRequest {
                model: self.broker.model().to_string(),
                system_prompt: self.system_prompt.clone(),
                messages: messages.clone(),
                tools: descriptors.clone(),
                context: context.clone(),
            };
            let response = ModelNext::new(&self.middleware, &self.broker).run(request).await?;

            let tool_calls = response.tool_calls.clone();
            messages.push(LlmMessage::from(response));

            if tool_calls.is_empty() {
                info!(chat_id = %chat_id, model_calls = iteration, "Invocation complete");
                return Ok(messages);
            }

            info!("Tool calls requested: {}", tool_calls.len());

            // Every call settles before the first failure is reported
            let outputs = join_all(tool_calls.iter().map(|call| {
                ToolNext::new(&self.middleware, &self.tools).run(ToolCallRequest {
                    tool_call: call.clone(),
                    context: context.clone(),
                })
            }))
            .await
            .into_iter()
            .collect::<Result<Vec<Value>>>()?;

            for (call, output) in tool_calls.iter().zip(outputs) {
                messages.push(LlmMessage::tool(tool_output_text(output)?, call.id.clone()));
            }
        }

        Err(HarnessError::AgentError(format!(
            "no final answer after {} model calls",
            self.max_iterations
        )))
    }
}

/// Tool results reach the model as text; strings pass through, anything else as JSON.
fn tool_output_text(output: Value) -> Result<String> {
    match output {
        Value::String(text) => Ok(text),
        other => Ok(serde_json::to_string(&other)?),
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    broker: LlmBroker,
    tools: Vec<Arc<dyn LlmTool>>,
    middleware: Vec<Arc<dyn AgentMiddleware>>,
    system_prompt: Option<String>,
    max_iterations: usize,
}

impl AgentBuilder {
    fn new(broker: LlmBroker) -> Self {
        Self {
            broker,
            tools: Vec::new(),
            middleware: Vec::new(),
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tool(mut self, tool: impl LlmTool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Add a middleware; earlier registrations wrap later ones.
    pub fn middleware(mut self, middleware: impl AgentMiddleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            broker: self.broker,
            tools: self.tools,
            middleware: self.middleware,
            system_prompt: self.system_prompt,
            max_iterations: self.max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::models::MessageRole;
    use crate::llm::tools::WeatherTool;
    use crate::test_support::{
        calls, failure, text, tool_call, EchoTool, FailingTool, ScriptedGateway, WeatherRuleGateway,
    };
    use crate::tracer::{TraceKind, TraceStep, TraceStore, TracingMiddleware};
    use serde_json::json;

    fn traced_weather_agent(gateway: Arc<dyn crate::llm::LlmGateway>) -> (Agent, Arc<TraceStore>) {
        let traces = Arc::new(TraceStore::default());
        let agent = Agent::builder(LlmBroker::new("gpt-oss-20b", gateway))
            .system_prompt("You are a helpful assistant that provides weather information.")
            .tool(WeatherTool)
            .middleware(TracingMiddleware::recording_into(&traces))
            .build();
        (agent, traces)
    }

    fn kinds(steps: &[TraceStep]) -> Vec<TraceKind> {
        steps.iter().map(|s| s.kind).collect()
    }

    async fn ask(agent: &Agent, history: Vec<LlmMessage>, question: &str, chat_id: &str) -> Vec<LlmMessage> {
        let mut messages = history;
        messages.push(LlmMessage::user(question));
        agent.invoke(messages, InvocationContext::new(chat_id)).await.unwrap()
    }

    #[tokio::test]
    async fn test_plain_answer_returns_history_plus_reply() {
        let gateway = ScriptedGateway::new(vec![text("Hello there")]);
        let (agent, traces) = traced_weather_agent(gateway.clone());

        let history = ask(&agent, vec![], "Hi", "123").await;

        assert_eq!(history, vec![LlmMessage::user("Hi"), LlmMessage::assistant("Hello there")]);
        assert_eq!(kinds(&traces.list("123")), vec![TraceKind::Model]);

        // The system prompt is sent to the model but never stored in the history
        let sent = gateway.requests();
        assert_eq!(sent[0][0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_tool_round_trip_appends_call_and_result() {
        let gateway = ScriptedGateway::new(vec![
            calls(vec![tool_call("call_1", "get_weather", json!({"location": "New York"}))]),
            text("It is sunny in New York."),
        ]);
        let (agent, traces) = traced_weather_agent(gateway.clone());

        let history = ask(&agent, vec![], "What's the weather like in New York?", "123").await;

        assert_eq!(history.len(), 4);
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].tool_calls.as_ref().map(|c| c.len()), Some(1));
        assert_eq!(
            history[2],
            LlmMessage::tool(
                "The weather in New York is sunny with a high of 25°C and a low of 15°C.",
                Some("call_1".to_string())
            )
        );
        assert_eq!(history[3], LlmMessage::assistant("It is sunny in New York."));

        let steps = traces.list("123");
        assert_eq!(kinds(&steps), vec![TraceKind::Model, TraceKind::Tool, TraceKind::Model]);
        assert_eq!(steps[1].name, "get_weather");
        assert_eq!(steps[1].input, json!({"location": "New York"}));
        assert_eq!(
            steps[1].output(),
            Some(&json!("The weather in New York is sunny with a high of 25°C and a low of 15°C."))
        );
        // Second model call sees the tool result
        assert_eq!(gateway.requests()[1].len(), 4);
    }

    #[tokio::test]
    async fn test_three_turn_weather_session() {
        let (agent, traces) = traced_weather_agent(Arc::new(WeatherRuleGateway));

        let history = ask(&agent, vec![], "What's the weather like in New York?", "123").await;
        let history = ask(&agent, history, "What did I just ask you to do?", "123").await;
        let history = ask(&agent, history, "What's the weather like in Paris?", "123").await;

        let steps = traces.list("123");
        assert_eq!(
            kinds(&steps),
            vec![
                TraceKind::Model,
                TraceKind::Tool,
                TraceKind::Model,
                TraceKind::Model,
                TraceKind::Model,
                TraceKind::Tool,
                TraceKind::Model,
            ]
        );

        // Every tool step directly follows the model step that asked for it
        for (i, step) in steps.iter().enumerate() {
            if step.kind == TraceKind::Tool {
                let previous = &steps[i - 1];
                assert_eq!(previous.kind, TraceKind::Model);
                let requested = &previous.output().unwrap()["tool_calls"][0];
                assert_eq!(requested["name"], json!(step.name));
                assert_eq!(requested["arguments"], step.input);
            }
        }

        assert!(steps.iter().all(|s| s.session_id == "123" && s.output().is_some()));
        assert_eq!(history.last(), Some(&LlmMessage::assistant(
            "Forecast: The weather in Paris is sunny with a high of 25°C and a low of 15°C."
        )));
    }

    #[tokio::test]
    async fn test_parallel_tool_calls_keep_request_order_in_history() {
        let gateway = ScriptedGateway::new(vec![
            calls(vec![
                tool_call("call_a", "get_weather", json!({"location": "Oslo"})),
                tool_call("call_b", "get_weather", json!({"location": "Rome"})),
            ]),
            text("Both sunny."),
        ]);
        let (agent, traces) = traced_weather_agent(gateway);

        let history = ask(&agent, vec![], "Weather in Oslo and Rome?", "multi").await;

        assert_eq!(history[2].tool_call_id, Some("call_a".to_string()));
        assert!(history[2].content.as_deref().unwrap_or_default().contains("Oslo"));
        assert_eq!(history[3].tool_call_id, Some("call_b".to_string()));
        assert!(history[3].content.as_deref().unwrap_or_default().contains("Rome"));

        let steps = traces.list("multi");
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].kind, TraceKind::Model);
        assert_eq!(steps[1].kind, TraceKind::Tool);
        assert_eq!(steps[2].kind, TraceKind::Tool);
        assert_eq!(steps[3].kind, TraceKind::Model);
    }

    #[tokio::test]
    async fn test_model_failure_is_returned_unchanged_and_traced() {
        let gateway = ScriptedGateway::new(vec![failure("connection refused")]);
        let (agent, traces) = traced_weather_agent(gateway);

        let result = agent.invoke(vec![LlmMessage::user("Hi")], InvocationContext::new("err")).await;

        match result {
            Err(HarnessError::GatewayError(message)) => assert_eq!(message, "connection refused"),
            other => panic!("Expected GatewayError, got {:?}", other),
        }

        let steps = traces.list("err");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].error(), Some("LLM gateway error: connection refused"));
        assert!(steps[0].output().is_none());
    }

    #[tokio::test]
    async fn test_tool_failure_aborts_invocation() {
        let traces = Arc::new(TraceStore::default());
        let gateway = ScriptedGateway::new(vec![
            calls(vec![tool_call("call_1", "fail", json!({}))]),
            text("unreachable"),
        ]);
        let agent = Agent::builder(LlmBroker::new("test-model", gateway.clone()))
            .tool(FailingTool)
            .middleware(TracingMiddleware::recording_into(&traces))
            .build();

        let result = agent.invoke(vec![LlmMessage::user("go")], InvocationContext::new("t")).await;

        assert!(matches!(result, Err(HarnessError::ToolError(ref m)) if m == "always fails"));
        let steps = traces.list("t");
        assert_eq!(kinds(&steps), vec![TraceKind::Model, TraceKind::Tool]);
        assert_eq!(steps[1].error(), Some("Tool error: always fails"));
        assert_eq!(gateway.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_chat_id_is_rejected_before_any_call() {
        let gateway = ScriptedGateway::new(vec![text("never")]);
        let (agent, traces) = traced_weather_agent(gateway.clone());

        let result = agent.invoke(vec![LlmMessage::user("Hi")], InvocationContext::new("")).await;

        assert!(matches!(result, Err(HarnessError::MissingContext(_))));
        assert!(gateway.requests().is_empty());
        assert!(traces.is_empty());
    }

    #[tokio::test]
    async fn test_iteration_limit_stops_endless_tool_calls() {
        let gateway = ScriptedGateway::new(vec![
            calls(vec![tool_call("c1", "echo", json!({"text": "a"}))]),
            calls(vec![tool_call("c2", "echo", json!({"text": "b"}))]),
            calls(vec![tool_call("c3", "echo", json!({"text": "c"}))]),
        ]);
        let agent = Agent::builder(LlmBroker::new("test-model", gateway.clone()))
            .tool(EchoTool)
            .max_iterations(2)
            .build();

        let result = agent.invoke(vec![LlmMessage::user("loop")], InvocationContext::new("x")).await;

        assert!(matches!(result, Err(HarnessError::AgentError(_))));
        assert_eq!(gateway.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_structured_tool_output_is_sent_as_json() {
        struct ObjectTool;

        impl LlmTool for ObjectTool {
            fn run(&self, _args: &std::collections::HashMap<String, Value>) -> Result<Value> {
                Ok(json!({"temp": 25}))
            }

            fn descriptor(&self) -> ToolDescriptor {
                ToolDescriptor::function("object", "Returns an object", json!({"type": "object"}))
            }
        }

        let gateway = ScriptedGateway::new(vec![
            calls(vec![tool_call("c1", "object", json!({}))]),
            text("done"),
        ]);
        let agent = Agent::builder(LlmBroker::new("test-model", gateway)).tool(ObjectTool).build();

        let history = agent.invoke(vec![LlmMessage::user("go")], InvocationContext::new("x")).await.unwrap();

        assert_eq!(history[2].content, Some(r#"{"temp":25}"#.to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sessions_do_not_mix_traces() {
        let (agent, traces) = traced_weather_agent(Arc::new(WeatherRuleGateway));
        let agent = Arc::new(agent);

        let mut handles = Vec::new();
        for i in 0..10 {
            let agent = Arc::clone(&agent);
            handles.push(tokio::spawn(async move {
                let chat_id = format!("chat-{}", i);
                let question = if i % 2 == 0 {
                    format!("What's the weather in City{}?", i)
                } else {
                    "Tell me a joke".to_string()
                };
                agent
                    .invoke(vec![LlmMessage::user(question)], InvocationContext::new(chat_id))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..10 {
            let steps = traces.list(&format!("chat-{}", i));
            assert!(steps.iter().all(|s| s.session_id == format!("chat-{}", i)));
            if i % 2 == 0 {
                assert_eq!(kinds(&steps), vec![TraceKind::Model, TraceKind::Tool, TraceKind::Model]);
                assert_eq!(steps[1].input, json!({"location": format!("City{}", i)}));
            } else {
                assert_eq!(kinds(&steps), vec![TraceKind::Model]);
            }
        }
        assert_eq!(traces.session_ids().len(), 10);
    }

    #[tokio::test]
    async fn test_failed_tool_does_not_hide_sibling_calls() {
        let traces = Arc::new(TraceStore::default());
        let gateway = ScriptedGateway::new(vec![
            calls(vec![
                tool_call("c1", "fail", json!({})),
                tool_call("c2", "echo", json!({"text": "still runs"})),
            ]),
            text("unreachable"),
        ]);
        let agent = Agent::builder(LlmBroker::new("m", gateway.clone()))
            .tool(FailingTool)
            .tool(EchoTool)
            .middleware(TracingMiddleware::recording_into(&traces))
            .build();

        let result = agent.invoke(vec![LlmMessage::user("go")], InvocationContext::new("s")).await;

        assert!(matches!(result, Err(HarnessError::ToolError(ref m)) if m == "always fails"));
        let steps = traces.list("s");
        assert_eq!(kinds(&steps), vec![TraceKind::Model, TraceKind::Tool, TraceKind::Tool]);
        let fail = steps.iter().find(|s| s.name == "fail").unwrap();
        assert_eq!(fail.error(), Some("Tool error: always fails"));
        let echo = steps.iter().find(|s| s.name == "echo").unwrap();
        assert_eq!(echo.output(), Some(&json!("still runs")));
        assert_eq!(gateway.requests().len(), 1);
    }
}
