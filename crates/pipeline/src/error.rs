/// Errors surfaced by the job registry and its drivers.
///
/// Per-scene failures are not errors at this level; they are recorded on
/// the scene and exposed through the job snapshot.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Generation job not found: {0}")]
    NotFound(String),

    /// The batch never reached an engine. Fatal for the job.
    #[error("Submission failed: {0}")]
    SubmissionFailure(String),

    /// A callback addressed a job that cannot accept it.
    #[error("Callback rejected for job {id}: {reason}")]
    CallbackMismatch { id: String, reason: String },
}

impl JobError {
    pub fn not_found(id: &str) -> Self {
        Self::NotFound(id.to_string())
    }
}
