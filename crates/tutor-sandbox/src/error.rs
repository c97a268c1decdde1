//! Error types for the storage gateway
//!
//! Covers the failure surface of the capability interface:
//! - Missing files
//! - Transport failures reaching the provider
//! - Provider-side rejections
//! - Malformed provider responses

/// Storage gateway error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested path does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport-level failure reaching the provider
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider rejected the request
    #[error("provider error ({status}): {message}")]
    Provider {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider error body, best effort
        message: String,
    },

    /// Provider response could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Watch subscription could not be established
    #[error("watch subscription failed: {0}")]
    WatchFailed(String),
}

impl StorageError {
    /// Check whether the error means "the path is absent"
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_predicate() {
        let err = StorageError::NotFound("input/topics.txt".to_string());
        assert!(err.is_not_found());

        let err = StorageError::Provider {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn error_messages_are_lowercase() {
        let err = StorageError::NotFound("x".to_string());
        assert_eq!(err.to_string(), "not found: x");
    }
}
