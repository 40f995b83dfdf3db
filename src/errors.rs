use thiserror::Error;

/// Exit status reserved for a run stopped by an external interrupt.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum AppError {
    /// No output table requested, or an output directory cannot be prepared
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// Malformed or truncated source document
    #[error("Parse error: {0}")]
    ParseError(String),
    /// A sink or the source could not be opened, written, or flushed
    #[error("IO error: {0}")]
    IoError(String),
    /// Invalid CLI arguments or configuration file contents
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// An external stop request was observed between elements
    #[error("Interrupted before the document was fully processed")]
    Interrupted,
}

impl AppError {
    /// Process exit status the binary reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Interrupted => EXIT_INTERRUPTED,
            _ => 1,
        }
    }
}

// Conversion implementations for common errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(err: quick_xml::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::InvalidInput(format!("Failed to parse config: {err}"))
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
