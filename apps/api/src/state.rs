use std::sync::Arc;

use crate::interview::engine::InterviewEngine;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Used directly by résumé analysis; the engine holds its own handle.
    pub llm: Arc<dyn TextGenerator>,
    pub engine: InterviewEngine,
}
