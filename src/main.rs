//! Fortune Chat - fortune-telling chatbot API
//!
//! Serves persona-driven chat sessions: the user picks a fortune style
//! (or just asks a question) and each turn is answered by an
//! OpenAI-compatible completion endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod providers;
mod routes;

use config::{Config, PersonaMap};
use crate::core::{ConversationController, SessionLimits, SessionStore};
use providers::{CompletionProvider, OpenAICompatConfig, OpenAICompatProvider};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ConversationController>,
    pub sessions: Arc<SessionStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fortune_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let personas = match &config.prompts_dir {
        Some(dir) => PersonaMap::load(config.locale, dir).await,
        None => PersonaMap::builtin(config.locale),
    };

    // A missing key is not fatal: sessions still open, replies explain the problem
    let provider = match OpenAICompatConfig::from_config(&config) {
        Ok(provider_config) => {
            let provider = OpenAICompatProvider::new(provider_config)?;
            tracing::info!("🤖 Using model {}", provider.model());
            Ok(Arc::new(provider) as Arc<dyn CompletionProvider>)
        }
        Err(e) => {
            tracing::warn!("{}; replies will report the missing key", e);
            Err(e)
        }
    };

    let sessions = Arc::new(SessionStore::with_limits(SessionLimits {
        ttl: config.session_ttl(),
        max_sessions: config.max_sessions,
    }));
    sessions.spawn_sweeper(config.sweep_interval());

    let state = AppState {
        controller: Arc::new(ConversationController::new(
            config.locale,
            personas,
            provider,
        )),
        sessions,
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🔮 Fortune Chat API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
