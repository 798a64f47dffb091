use skiff_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbError> for StoreError {
    fn from(e: LmdbError) -> Self {
        StoreError::Backend(e.to_string())
    }
}
