use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON decode error: {0}")]
    JsonDecodeError(#[from] serde_json::Error),

    #[error("YAML decode error: {0}")]
    YamlDecodeError(#[from] serde_yaml::Error),

    #[error("Problem record {record} is malformed: {message}")]
    ProblemFormatError { record: usize, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Server error: {message}")]
    ServerError { message: String },
}

impl AppError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "Input file not found".to_string()
            }
            AppError::IoError(e) => format!("Failed to read input: {}", e),
            AppError::CsvError(e) => format!("Problem file could not be parsed: {}", e),
            AppError::ProblemFormatError { record, message } => {
                format!("Problem #{} in the file is invalid: {}", record, message)
            }
            AppError::JsonDecodeError(e) => format!("Route document is not valid JSON: {}", e),
            AppError::YamlDecodeError(e) => format!("Route document is not valid YAML: {}", e),
            AppError::ConfigError { message } => message.clone(),
            AppError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("Option '{}' has an invalid value '{}': {}", field, value, reason),
            AppError::ServerError { message } => format!("Server failed: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::IoError(_) => "Check that the file exists and is readable",
            AppError::CsvError(_) | AppError::ProblemFormatError { .. } => {
                "Every line must hold exactly two comma-separated fields: question,answer"
            }
            AppError::JsonDecodeError(_) | AppError::YamlDecodeError(_) => {
                "The document must be a list of entries with 'path' and 'url' keys"
            }
            AppError::ConfigError { .. } | AppError::InvalidConfigValueError { .. } => {
                "Run with --help to see the accepted options"
            }
            AppError::ServerError { .. } => "Check that the bind address is free and retry",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
