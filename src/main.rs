use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trace_harness::config::Config;
use trace_harness::server::{self, AppState};
use trace_harness::tracer::TraceStore;
use trace_harness::weather_agent::weather_agent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let traces = Arc::new(TraceStore::default());
    let agent = weather_agent(&config.llm, &traces).context("failed to build the agent")?;

    let traces_dir = if config.server.traces_dir.is_absolute() {
        config.server.traces_dir.clone()
    } else {
        std::env::current_dir()
            .context("failed to resolve the working directory")?
            .join(&config.server.traces_dir)
    };

    let state = AppState::new(agent, traces, traces_dir);
    server::serve(state, config.server.port).await.context("server error")?;
    Ok(())
}
