use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        match e {
            config::ConfigError::NotFound(path) => ConfigError::FileNotFound(path),
            config::ConfigError::FileParse { uri, cause } => ConfigError::ParseError(format!(
                "{}: {}",
                uri.unwrap_or_else(|| "<unknown>".to_string()),
                cause
            )),
            other => ConfigError::Environment(other.to_string()),
        }
    }
}
