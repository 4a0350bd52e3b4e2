use thiserror::Error;

#[derive(Error, Debug)]
pub enum VizcatError {
    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query service error: {message}")]
    Service { message: String },

    #[error("Query for catalog '{catalog}' timed out after {secs}s")]
    Timeout { catalog: String, secs: u64 },

    #[error("Malformed response for catalog '{catalog}': {reason}")]
    MalformedResponse { catalog: String, reason: String },
}

pub type Result<T> = std::result::Result<T, VizcatError>;
