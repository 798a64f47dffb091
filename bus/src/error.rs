use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("broker connection failed: {0}")]
    Connect(String),

    #[error("transport closed")]
    Closed,

    #[error("frame encoding failed: {0}")]
    Encode(String),
}
