use thiserror::Error;

#[derive(Error, Debug)]
pub enum GmailError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("Gmail API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed Gmail payload: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, GmailError>;
