use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the swim analyzer.
#[derive(Error, Debug)]
pub enum SwimError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export document is not well-formed XML.
    #[error("Failed to parse XML: {0}")]
    XmlParse(#[from] quick_xml::Error),

    /// A record is missing a required field or carries an unusable value.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A ratio was requested whose denominator is zero or not finite.
    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    /// No `export.xml` could be located at the given path.
    #[error("Export file not found: {0}")]
    ExportNotFound(PathBuf),

    /// Writing a CSV table failed.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the swim crates.
pub type Result<T> = std::result::Result<T, SwimError>;
