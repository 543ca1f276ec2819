//! Error types for Kayd

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// `message` is empty when the server gave no reason
    #[error("API error ({status}){}", message_suffix(.message))]
    Api { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Not signed in. Run 'kayd login' first.")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file not found. Run 'kayd init' first.")]
    ConfigNotFound,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the server refused the credentials (401/403)
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Error::Api { status: 401 | 403, .. })
    }

    /// Whether this failure came from local persistence
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_))
    }

    /// The message supplied by the server, if the server sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    /// A message fit for showing to the user, preferring the server's own wording
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::NotAuthenticated => self.to_string(),
            _ => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

fn message_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {}", message)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
