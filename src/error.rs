use thiserror::Error;

/// Main error type for mireval
#[derive(Error, Debug)]
pub enum MirevalError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parse errors (TSV cells, tag-weight literals, genre lists)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown similarity metric name
    #[error("Unsupported metric: {0}. Use 'cosine' or 'euclidean'.")]
    UnsupportedMetric(String),

    /// A named column is missing from the candidate table
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Identifiers failed to resolve across joined sources
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using MirevalError
pub type Result<T> = std::result::Result<T, MirevalError>;
