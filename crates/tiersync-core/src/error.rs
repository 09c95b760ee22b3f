use thiserror::Error;

/// Core error types for tiersync operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid template reference '{template_ref}': expected <tier>-<type>-<hash>")]
    InvalidTemplateRef { template_ref: String },

    #[error("Invalid object data: {message}")]
    InvalidObject { message: String },
}

impl CoreError {
    /// Create a new InvalidTemplateRef error
    pub fn invalid_template_ref(template_ref: impl Into<String>) -> Self {
        Self::InvalidTemplateRef {
            template_ref: template_ref.into(),
        }
    }

    /// Create a new InvalidObject error
    pub fn invalid_object(message: impl Into<String>) -> Self {
        Self::InvalidObject {
            message: message.into(),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
