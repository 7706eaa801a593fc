use std::sync::Arc;

use occucode_core::{CodeIndex, CompletionModel, Embedder, LookupTable};

use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Raw model output → human-readable code.
    pub decoder: Arc<LookupTable>,
    /// Hosted fine-tuned classifier. Swapped for a stub in tests.
    pub model: Arc<dyn CompletionModel>,
    /// Present only when an embedding endpoint is configured.
    pub suggester: Option<Suggester>,
    pub sessions: SessionStore,
}

/// Code index plus the embedder used to embed queries against it.
#[derive(Clone)]
pub struct Suggester {
    pub index: Arc<CodeIndex>,
    pub embedder: Arc<dyn Embedder>,
}
