use std::sync::Arc;

use writetalent_llm::Storyteller;
use writetalent_pipeline::JobDispatcher;

use crate::auth::verification::VerificationStore;
use crate::config::ServerConfig;
use crate::mail::VerificationMailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: writetalent_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Creates generation jobs and owns the job registry.
    pub dispatcher: JobDispatcher,
    /// Story generation and originality scoring.
    pub storyteller: Arc<dyn Storyteller>,
    /// Outstanding password-reset codes.
    pub verification_codes: Arc<VerificationStore>,
    /// `None` when SMTP is not configured; codes are then only logged.
    pub mailer: Option<Arc<VerificationMailer>>,
}
