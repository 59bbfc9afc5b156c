use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid menu payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Status {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// The response body did not have the expected shape
    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode(_))
    }

    /// Whether retrying the same request could succeed.
    /// Transport failures, rate limiting and server errors are transient;
    /// a bad payload or a 4xx will not change on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(e) => !e.is_decode() && !e.is_builder(),
            ApiError::Status { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
            ApiError::Decode(_) => false,
        }
    }
}
