//! SketchLens Server
//!
//! Hosts drawing sessions over HTTP: strokes and grid toggling, annotation
//! import, PNG / JSON / Markdown exports, and AI analysis of the sketch.
//!
//! ## Configuration
//!
//! | variable | default |
//! |---|---|
//! | `SKETCHLENS_ADDR` | `0.0.0.0:3030` |
//! | `OPENAI_API_KEY` | unset (analysis disabled) |
//! | `SKETCHLENS_OPENAI_URL` | OpenAI chat completions |
//! | `SKETCHLENS_MODEL` | `gpt-4o-mini` |
//! | `SKETCHLENS_MAX_TOKENS` | `800` |
//! | `SKETCHLENS_TIMEOUT_SECS` | `60` |
//! | `SKETCHLENS_TTS` | off |
//! | `SKETCHLENS_SESSION_TTL_SECS` | `3600` |
//! | `SKETCHLENS_MAX_SESSIONS` | `256` |

mod analysis;
mod config;
mod error;
mod openai;
mod routes;
mod speech;
mod state;

use config::ServerConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; `log` records from the library crates are bridged in.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sketchlens_server=info,sketchlens_core=info,sketchlens_render=info,tower_http=info"
                    .into()
            }),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState::from_config(&config));
    tokio::spawn(state::sweep_idle_sessions(state.clone(), config.session_ttl));

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("SketchLens server listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
