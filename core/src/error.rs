use thiserror::Error;

/// Failures of the similarity core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("cannot build a vector space from an empty corpus")]
    EmptyCorpus,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index holds {index_len} documents but {items_len} items were supplied")]
    InconsistentIndex { index_len: usize, items_len: usize },
}

impl CoreError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Failures while reading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("malformed catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}
