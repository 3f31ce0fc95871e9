use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DripError>;

#[derive(Error, Debug)]
pub enum DripError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Solana RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Referrer mismatch: expected {expected}, position has {actual}")]
    ReferrerMismatch { expected: Pubkey, actual: Pubkey },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Transaction {signature} failed: {message}")]
    Transaction { signature: String, message: String },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Timeout waiting for {0}")]
    Timeout(String),
}

/// Coarse classification used by callers deciding how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed local configuration (wallet secret, settings).
    Configuration,
    /// The remote system offered nothing to operate on.
    Resolution,
    /// Anything that went wrong talking to the gateway or the cluster.
    Remote,
}

impl DripError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn wallet<S: Into<String>>(msg: S) -> Self {
        Self::Wallet(msg.into())
    }

    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn api(status: u16, message: String) -> Self {
        Self::Api { status, message }
    }

    pub fn signing<S: Into<String>>(msg: S) -> Self {
        Self::Signing(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Settings(_) | Self::Wallet(_) | Self::UrlParse(_) => {
                ErrorKind::Configuration
            }
            Self::Resolution(_) => ErrorKind::Resolution,
            // Local validation of a request is still a configuration problem.
            Self::Validation(_) => ErrorKind::Configuration,
            _ => ErrorKind::Remote,
        }
    }

    /// Whether a failed idempotent query is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
