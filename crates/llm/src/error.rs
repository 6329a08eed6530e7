#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The completion API returned a non-2xx status code.
    #[error("Completion API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The model answered without any usable content.
    #[error("Completion API returned an empty reply")]
    EmptyReply,
}
