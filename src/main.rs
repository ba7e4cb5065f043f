use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mentorbot::config::AppConfig;
use mentorbot::conversation::ConversationStore;
use mentorbot::llm::OpenAiClient;
use mentorbot::relay::CompletionRelay;
use mentorbot::routes::configure_routes;
use mentorbot::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mentorbot=info,warp=info")),
        )
        .init();

    let provider = Arc::new(OpenAiClient::new(config.openai_config())?);
    let model = provider.model().to_string();

    let mut store =
        ConversationStore::new(config.system_prompt.clone()).with_max_sessions(config.max_sessions);
    if let Some(limit) = config.history_limit {
        store = store.with_history_limit(limit);
    }

    let relay = CompletionRelay::new(provider, Arc::new(store))
        .with_generation_config(config.generation.clone())
        .with_cleaning(config.clean_output)
        .with_idle_timeout(config.timeout);
    let clean_output = relay.cleans_output();

    let routes = configure_routes(Arc::new(AppState::new(relay)));

    let (addr, server) = warp::serve(routes).try_bind_with_graceful_shutdown(config.bind, async {
        tokio::signal::ctrl_c().await.ok();
    })?;

    info!(
        %addr,
        model = %model,
        persona = %config.persona,
        clean_output,
        max_sessions = config.max_sessions,
        "MentorBot listening"
    );
    server.await;
    info!("shut down");

    Ok(())
}
