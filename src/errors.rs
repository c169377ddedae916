use thiserror::Error;

/// User-facing failures. Anything else surfacing from a service call is an
/// unclassified `anyhow` error (I/O, SQLite, malformed CSV encoding).
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LedgerError {
    #[error("Transaction does not exist")]
    TransactionNotFound(i64),

    #[error("No categories found")]
    NoCategories,

    #[error("No transactions found")]
    NoTransactions,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl LedgerError {
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Self::TransactionNotFound(_))
    }

    pub(crate) fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoCategories | Self::NoTransactions | Self::MissingField(_)
        )
    }
}
