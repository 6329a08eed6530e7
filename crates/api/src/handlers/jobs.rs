//! Job lookup and callback handling shared by the image and video routes.

use axum::body::Bytes;
use writetalent_n8n::CallbackPayload;
use writetalent_pipeline::{GenerationJob, JobError, JobKind};

use crate::error::AppResult;
use crate::response::CallbackAck;
use crate::state::AppState;

/// Snapshot of job `id`, provided it is of `kind`.
///
/// A job of another kind is reported as not found so image and video ids
/// cannot be read through each other's routes.
pub async fn fetch_job(state: &AppState, id: &str, kind: JobKind) -> AppResult<GenerationJob> {
    let job = state.dispatcher.registry().get(id).await?;
    if job.kind != kind {
        return Err(JobError::not_found(id).into());
    }
    Ok(job)
}

/// Apply a raw callback body to job `id`.
///
/// The workflow engine always gets an acknowledgement; unknown jobs,
/// mismatches and unreadable bodies are logged and otherwise ignored.
pub async fn acknowledge_callback(
    state: &AppState,
    id: &str,
    kind: JobKind,
    body: &Bytes,
) -> CallbackAck {
    let payload: CallbackPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(job_id = %id, error = %e, "Unreadable workflow callback body");
            return CallbackAck {
                success: true,
                message: "Callback ignored: unreadable body".into(),
            };
        }
    };

    match state
        .dispatcher
        .registry()
        .apply_callback(id, kind, &payload)
        .await
    {
        Ok(outcome) => CallbackAck {
            success: true,
            message: format!("Job updated, status {}", outcome.status.as_str()),
        },
        Err(e @ JobError::NotFound(_)) => {
            tracing::warn!(job_id = %id, error = %e, "Callback for unknown job");
            CallbackAck {
                success: true,
                message: "Callback ignored: job not found".into(),
            }
        }
        Err(e) => {
            tracing::warn!(job_id = %id, error = %e, "Callback rejected");
            CallbackAck {
                success: true,
                message: format!("Callback ignored: {e}"),
            }
        }
    }
}
