use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse {document}: {message}")]
    ParseError { document: String, message: String },

    #[error("Persistence failed for {document}: {message}")]
    PersistenceError { document: String, message: String },

    #[error("Document not found: {path}")]
    DocumentNotFound { path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Persistence,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        EtlError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::ParseError { .. }
            | EtlError::DocumentNotFound { .. }
            | EtlError::SerializationError(_) => ErrorCategory::Input,
            EtlError::PersistenceError { .. } | EtlError::DatabaseError(_) => {
                ErrorCategory::Persistence
            }
            EtlError::IoError(_) | EtlError::ProcessingError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一文件的問題不影響整批
            EtlError::ParseError { .. } => ErrorSeverity::Low,
            EtlError::PersistenceError { .. } | EtlError::DatabaseError(_) => ErrorSeverity::Medium,
            EtlError::DocumentNotFound { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::ConfigError { .. } | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the mapping file and TOML configuration (paths, policy, format settings)"
            }
            ErrorCategory::Input => "Verify the document exists and is valid JSON",
            ErrorCategory::Persistence => {
                "Check the database URL and that the database file is writable"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ConfigError { message } => format!("Configuration problem: {}", message),
            EtlError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            EtlError::InvalidConfigValueError { field, value, reason } => {
                format!("Setting '{}' has invalid value '{}': {}", field, value, reason)
            }
            EtlError::DocumentNotFound { path } => format!("File not found: {}", path),
            EtlError::ParseError { document, .. } => {
                format!("{} is not valid JSON and was skipped", document)
            }
            EtlError::PersistenceError { document, .. } => {
                format!("Could not save records of {} to the database", document)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical_or_high() {
        let err = EtlError::config("mapping.json not found");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("mapping.json"));

        let err = EtlError::InvalidConfigValueError {
            field: "processing.concurrency".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_document_errors_are_recoverable() {
        let err = EtlError::ParseError {
            document: "broken.json".to_string(),
            message: "expected value at line 1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.severity() < ErrorSeverity::High);

        let err = EtlError::PersistenceError {
            document: "a.json".to_string(),
            message: "database is locked".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Persistence);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}
