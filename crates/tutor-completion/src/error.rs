//! Error types for the completion gateway

/// Completion gateway error type
///
/// All variants mean the same thing to the queue processor: "no
/// answer available for this question", but they stay distinguishable for
/// logs and tests.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Transport-level failure reaching the provider
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider rejected the request (auth, rate limit, bad request)
    #[error("provider error ({status}): {message}")]
    Provider {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider error body, best effort
        message: String,
    },

    /// Provider response carried no usable completion
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_message() {
        let err = CompletionError::Provider {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "provider error (429): rate limited");
    }
}
