use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for locator operations.
pub type LocateResult<T> = Result<T, LocateError>;

/// The error type for locating and tapping templates on a device screen.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Invalid input: {description}")]
    InvalidInput { description: String },

    #[error("Template not found on screen (best score {best_score:.3} < threshold {threshold:.3})")]
    NotFound { best_score: f32, threshold: f32 },

    #[error("Operation timed out after {duration:?}: {description}")]
    Timeout {
        duration: Duration,
        description: String,
    },

    #[error("Session command '{command}' failed: {description}")]
    Session {
        command: String,
        description: String,
    },

    #[error("Invalid configuration value for {key}: {description}")]
    Config { key: String, description: String },
}

impl LocateError {
    pub fn invalid_input(description: impl Into<String>) -> Self {
        LocateError::InvalidInput {
            description: description.into(),
        }
    }

    pub fn session(command: impl Into<String>, description: impl Into<String>) -> Self {
        LocateError::Session {
            command: command.into(),
            description: description.into(),
        }
    }

    /// Whether a fresh screenshot might change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LocateError::NotFound { .. } | LocateError::Timeout { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LocateError::NotFound { .. })
    }
}

impl From<image::ImageError> for LocateError {
    fn from(source: image::ImageError) -> Self {
        LocateError::InvalidInput {
            description: format!("image decode failed: {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let not_found = LocateError::NotFound {
            best_score: 0.4,
            threshold: 0.8,
        };
        let timeout = LocateError::Timeout {
            duration: Duration::from_secs(1),
            description: "screenshot".into(),
        };
        assert!(not_found.is_retryable());
        assert!(timeout.is_retryable());
        assert!(!LocateError::invalid_input("too big").is_retryable());
        assert!(!LocateError::session("tap", "boom").is_retryable());
    }

    #[test]
    fn test_not_found_message_carries_scores() {
        let err = LocateError::NotFound {
            best_score: 0.5,
            threshold: 0.8,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.500"), "got: {msg}");
        assert!(msg.contains("0.800"), "got: {msg}");
    }
}
