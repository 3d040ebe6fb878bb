use anyhow::Result as _Result;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RangelogError {
    #[error("Config Error: {message}")]
    Config { message: String },

    #[error("Invalid Argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid session document {source_name}: {message}")]
    InvalidDocument {
        source_name: String,
        message: String,
    },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parse Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML Parse Error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RangelogError {
    pub fn display_localized(&self) -> String {
        match self {
            RangelogError::Config { message } => {
                t!("errors.config_error", message = message).to_string()
            }
            RangelogError::InvalidArgument { message } => {
                t!("errors.invalid_argument", message = message).to_string()
            }
            RangelogError::InvalidDocument {
                source_name,
                message,
            } => t!(
                "errors.invalid_document",
                source = source_name,
                message = message
            )
            .to_string(),
            RangelogError::SessionNotFound { id } => {
                t!("errors.session_not_found", id = id).to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = _Result<T, RangelogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_messages_carry_arguments() {
        let err = RangelogError::SessionNotFound {
            id: "s-42".to_string(),
        };
        assert!(err.display_localized().contains("s-42"));

        let err = RangelogError::InvalidDocument {
            source_name: "export.json".to_string(),
            message: "expected an array".to_string(),
        };
        let text = err.display_localized();
        assert!(text.contains("export.json"));
        assert!(text.contains("expected an array"));
    }

    #[test]
    fn io_errors_fall_back_to_display() {
        let err = RangelogError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(err.display_localized(), "IO Error: missing");
    }
}
