use thiserror::Error;

/// Unified error type for the whole engine.
/// Every fallible operation returns Result<T, CoachError>; nothing panics
/// across a component boundary, and the shell is the only place a failure
/// becomes user-visible text.
#[derive(Debug, Error)]
pub enum CoachError {
    /// No API key is configured; the gateway refuses to call out.
    #[error("no API key is configured")]
    MissingCredential,

    /// The model endpoint could not be reached, answered with a non-success
    /// status, or returned a body that could not be read. `status` is None
    /// for connection-level failures and timeouts.
    #[error("model endpoint request failed: {body}")]
    Transport { status: Option<u16>, body: String },

    /// The endpoint answered but the response carried no usable candidate
    /// text, typically because the prompt was safety-filtered.
    #[error("model returned no usable reply")]
    EmptyResponse { block_reason: Option<String> },

    /// The model reply did not contain any of the expected step markers.
    /// The guidance session keeps its current step; nothing is lost.
    #[error("model reply did not match the expected step markers")]
    Unparseable { preview: String },

    /// Missing or malformed local input; no model call was made.
    #[error("{0}")]
    Validation(String),

    /// Problem bank lookup miss.
    #[error("problem not found: {0}")]
    NotFound(String),

    /// The episode this call belonged to was replaced while the call was in
    /// flight. The late result was dropped without touching any state.
    #[error("episode was replaced before the reply arrived")]
    Stale,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoachError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        CoachError::Validation(message.into())
    }

    pub fn transport<S: Into<String>>(status: Option<u16>, body: S) -> Self {
        CoachError::Transport {
            status,
            body: body.into(),
        }
    }
}
