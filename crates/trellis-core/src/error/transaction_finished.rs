use super::Error;

/// Error when a statement is issued through a transaction handle that has
/// already been committed or rolled back.
#[derive(Debug)]
pub(super) struct TransactionFinished;

impl std::error::Error for TransactionFinished {}

impl core::fmt::Display for TransactionFinished {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("transaction already committed or rolled back")
    }
}

impl Error {
    pub fn transaction_finished() -> Error {
        Error::from(super::ErrorKind::TransactionFinished(TransactionFinished))
    }

    pub fn is_transaction_finished(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TransactionFinished(_))
    }
}
