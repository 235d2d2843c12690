use thiserror::Error;

/// Error type for the hooksig binary, aggregating errors from the library
/// crates.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("signature error: {0}")]
    Signature(#[from] hooksig_core::SignatureError),

    #[error("http error: {0}")]
    Http(#[from] hooksig_http::HttpError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;
