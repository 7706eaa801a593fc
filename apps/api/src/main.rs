mod classify;
mod config;
mod errors;
mod labeling;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use occucode_core::{
    ChatCompletionClient, CodeIndex, Embedder, HttpEmbedder, LookupSchema, LookupTable,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::{AppState, Suggester};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "occucode_api={level},occucode_core={level},tower_http={level}",
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting occucode API v{}", env!("CARGO_PKG_VERSION"));

    // The service cannot decode anything without its table.
    let decoder = LookupTable::load(&config.decoder_path, LookupSchema::Serving)
        .with_context(|| format!("loading decoder {}", config.decoder_path.display()))?;
    info!(entries = decoder.len(), "decoder loaded");

    let model = ChatCompletionClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.model_id.clone(),
    )?;
    info!("Completion client initialized (model: {})", model.model());

    let suggester = build_suggester(&config).await?;

    let state = AppState {
        decoder: Arc::new(decoder),
        model: Arc::new(model),
        suggester,
        sessions: SessionStore::new(
            config.max_requests_per_session,
            config.contact_info.clone(),
            config.session_ttl,
        ),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Embeds every distinct code once at startup. Returns `None` when no
/// embedding endpoint is configured.
async fn build_suggester(config: &Config) -> Result<Option<Suggester>> {
    let Some(base_url) = config.embedding_base_url.clone() else {
        warn!("EMBEDDING_BASE_URL not set; code suggestions disabled");
        return Ok(None);
    };

    let codes = LookupTable::load(&config.codes_path, LookupSchema::Auto)
        .with_context(|| format!("loading codes {}", config.codes_path.display()))?
        .distinct_codes();

    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
        base_url,
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
    )?);
    let index = CodeIndex::build(codes, embedder.as_ref())
        .await
        .context("embedding code list")?;
    info!(
        codes = index.len(),
        model = %config.embedding_model,
        "code index built"
    );

    Ok(Some(Suggester {
        index: Arc::new(index),
        embedder,
    }))
}
