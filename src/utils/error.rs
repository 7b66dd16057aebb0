use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Discord API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Discord API returned {status}: {body}")]
    ApiStatusError { status: u16, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Card catalogue error: {message}")]
    CatalogError { message: String },

    #[error("Invalid interaction: {message}")]
    InteractionError { message: String },

    #[error("Signature verification failed: {message}")]
    SignatureError { message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Storage,
    Network,
    Data,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn config(message: impl Into<String>) -> Self {
        BotError::ConfigError {
            message: message.into(),
        }
    }

    pub fn interaction(message: impl Into<String>) -> Self {
        BotError::InteractionError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BotError::DatabaseError(_) | BotError::IoError(_) => ErrorCategory::Storage,
            BotError::ApiError(_) | BotError::ApiStatusError { .. } | BotError::ServerError { .. } => {
                ErrorCategory::Network
            }
            BotError::SerializationError(_)
            | BotError::CatalogError { .. }
            | BotError::InteractionError { .. } => ErrorCategory::Data,
            BotError::SignatureError { .. } => ErrorCategory::Security,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::InteractionError { .. } | BotError::SignatureError { .. } => ErrorSeverity::Low,
            BotError::ApiError(_) | BotError::ApiStatusError { .. } => ErrorSeverity::Medium,
            BotError::SerializationError(_) | BotError::CatalogError { .. } => ErrorSeverity::High,
            BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. } => ErrorSeverity::High,
            BotError::DatabaseError(_) | BotError::IoError(_) | BotError::ServerError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BotError::MissingConfigError { field } => {
                format!("Set {} in the environment or in the .env file", field)
            }
            BotError::InvalidConfigValueError { field, .. } => {
                format!("Check the value of {}", field)
            }
            BotError::ConfigError { .. } | BotError::ConfigValidationError { .. } => {
                "Check the environment variables and the rules file".to_string()
            }
            BotError::DatabaseError(_) => {
                "Check that DB_PATH is writable and not locked by another process".to_string()
            }
            BotError::IoError(_) => "Check file paths and permissions".to_string(),
            BotError::ApiError(_) | BotError::ApiStatusError { .. } => {
                "Check DISCORD_TOKEN, DISCORD_APPLICATION_ID and network connectivity".to_string()
            }
            BotError::SerializationError(_) | BotError::CatalogError { .. } => {
                "Check that cards.json is a valid array of card objects".to_string()
            }
            BotError::InteractionError { .. } => "The request was ignored".to_string(),
            BotError::SignatureError { .. } => {
                "Check DISCORD_PUBLIC_KEY matches the application".to_string()
            }
            BotError::ServerError { .. } => "Check BIND_ADDR and that the port is free".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Network => format!("Discord connection problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Security => format!("Rejected request: {}", self),
        }
    }
}

impl From<toml::de::Error> for BotError {
    fn from(e: toml::de::Error) -> Self {
        BotError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = BotError::MissingConfigError {
            field: "DISCORD_TOKEN".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn test_signature_errors_are_low_severity() {
        let err = BotError::SignatureError {
            message: "bad".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Security);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().starts_with("Rejected request"));
    }
}
