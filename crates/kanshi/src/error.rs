use thiserror::Error;

#[derive(Error, Debug)]
pub enum KanshiError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Parse failed: {0}")]
    ParseFailed(String),

    #[error("No streams available")]
    NoStreamsAvailable,

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

impl KanshiError {
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::ParseFailed(message.into())
    }

    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::FetchFailed(message.into())
    }
}

impl From<reqwest::Error> for KanshiError {
    fn from(error: reqwest::Error) -> Self {
        Self::FetchFailed(error.to_string())
    }
}

impl From<serde_json::Error> for KanshiError {
    fn from(error: serde_json::Error) -> Self {
        Self::ParseFailed(error.to_string())
    }
}

pub type KanshiResult<T> = Result<T, KanshiError>;
