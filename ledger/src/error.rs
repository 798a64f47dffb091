use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("ledger node error: {0}")]
    Node(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}
