use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot determine data directory; pass --data-dir or set BPQ_DATA_DIR")]
    NoDataDir,

    #[error("Ledger error in {path}: {message}")]
    LedgerError { path: PathBuf, message: String },

    #[error(transparent)]
    Core(#[from] bpq_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
