use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] skiff_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] skiff_store_lmdb::LmdbError),

    #[error("ledger RPC error: {0}")]
    Ledger(#[from] skiff_ledger::LedgerError),

    #[error("transport error: {0}")]
    Bus(#[from] skiff_bus::BusError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
