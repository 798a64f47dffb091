use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid block hash: {0}")]
    InvalidHash(String),

    #[error("invalid work nonce: {0}")]
    InvalidWork(String),

    #[error("malformed block event: {0}")]
    MalformedBlock(String),

    #[error("malformed registration record: {0}")]
    MalformedRegistration(String),
}
