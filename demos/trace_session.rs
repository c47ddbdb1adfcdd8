//! Traced Session Example
//!
//! Runs three turns of one conversation through the weather agent, prints the trace
//! recorded for the session, and writes it to `trace.json`.
//!
//! Reads LLM_BASE_URL, LLM_API_KEY and LLM_MODEL, falling back to a local
//! OpenAI-compatible server.
//!
//! Run with: cargo run --example trace_session

use std::sync::Arc;
use trace_harness::agent::InvocationContext;
use trace_harness::config::LlmConfig;
use trace_harness::llm::LlmMessage;
use trace_harness::tracer::TraceStore;
use trace_harness::weather_agent::weather_agent;

fn env_or(key: &str) -> Option<String> {
    let fallback = match key {
        "LLM_BASE_URL" => Some("http://localhost:8080/v1"),
        "LLM_API_KEY" => Some("dummy"),
        "LLM_MODEL" => Some("gpt-oss-20b"),
        _ => None,
    };
    std::env::var(key).ok().or_else(|| fallback.map(String::from))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = LlmConfig::from_lookup(env_or)?;
    let traces = Arc::new(TraceStore::default());
    let agent = weather_agent(&config, &traces)?;

    let chat_id = uuid::Uuid::new_v4().to_string();
    println!("Chat session: {}\n", chat_id);

    let questions = [
        "What's the weather like in New York?",
        "What did I just ask you to do?",
        "What's the weather like in Paris?",
    ];

    let mut history: Vec<LlmMessage> = Vec::new();
    for question in questions {
        println!("User: {}", question);
        history.push(LlmMessage::user(question));
        history = agent.invoke(history, InvocationContext::new(chat_id.clone())).await?;
        if let Some(answer) = history.last().and_then(|m| m.content.as_deref()) {
            println!("Agent: {}\n", answer);
        }
    }

    let steps = traces.list(&chat_id);
    println!("Recorded {} steps:", steps.len());
    for step in &steps {
        let status = if step.is_error() { "error" } else { "ok" };
        println!("  {:?} {} {}ms {}", step.kind, step.name, step.latency_ms, status);
    }

    std::fs::write("trace.json", serde_json::to_string_pretty(&steps)?)?;
    println!("\nTrace written to trace.json");

    Ok(())
}
