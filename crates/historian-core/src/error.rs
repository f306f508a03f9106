#[derive(thiserror::Error, Debug)]
pub enum HistorianError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid project root: {0}")]
    InvalidProjectRoot(String),

    #[error(
        "Invalid memory type: \"{0}\". Must be one of the built-in types or configured custom types."
    )]
    UnknownMemoryType(String),

    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Write operations only allowed within .mnemonics/ (got {0})")]
    OutOfScope(String),

    #[error("Memory record not found: {0}")]
    RecordNotFound(String),

    #[error("Malformed memory record {path}: {reason}")]
    MalformedRecord { path: String, reason: String },

    #[error("Verification failed for {path}: {reason}")]
    Verification { path: String, reason: String },

    #[error("Index command failed: {0}")]
    Index(String),
}
