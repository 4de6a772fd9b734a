use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::clients::KvStore;
use crate::pipeline::analyzer::Analyzer;
use crate::pipeline::status::StatusBoard;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Read side of the record store; the analyzer holds the same store for writes.
    pub records: Arc<dyn KvStore>,
    pub sessions: Arc<dyn SessionVerifier>,
    /// Per-subject status narrative and re-entrancy guard.
    pub status: StatusBoard,
    pub max_upload_bytes: usize,
}
