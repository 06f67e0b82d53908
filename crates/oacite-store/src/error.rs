use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid publication number for a ledger name: {0:?}")]
    InvalidPublication(String),

    #[error("ledger directory does not exist: {0}")]
    MissingRoot(std::path::PathBuf),

    #[error("ledger I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
