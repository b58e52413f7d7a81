use crate::db::Transaction;

/// Options for the fetch operations of a [`Repository`](super::Repository).
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub transacting: Option<Transaction>,

    /// Relation paths (`parts`, `parts.*`, `*`) or column paths (`name`,
    /// `parts.label`) to leave out
    pub exclude: Vec<String>,

    /// Columns to select, root level (`name`) or by relation path
    /// (`parts.label`). Identifiers and join columns are always selected.
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMethod {
    Insert,
    Update,
}

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub transacting: Option<Transaction>,

    /// Forces an insert or an update of the root record. Without it new
    /// records are inserted and others updated.
    pub method: Option<SaveMethod>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub transacting: Option<Transaction>,
}

impl FetchOptions {
    pub fn new() -> FetchOptions {
        FetchOptions::default()
    }

    pub fn transacting(mut self, transaction: &Transaction) -> FetchOptions {
        self.transacting = Some(transaction.clone());
        self
    }

    pub fn exclude<I, S>(mut self, paths: I) -> FetchOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> FetchOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }
}

impl SaveOptions {
    pub fn new() -> SaveOptions {
        SaveOptions::default()
    }

    pub fn transacting(mut self, transaction: &Transaction) -> SaveOptions {
        self.transacting = Some(transaction.clone());
        self
    }

    pub fn method(mut self, method: SaveMethod) -> SaveOptions {
        self.method = Some(method);
        self
    }
}

impl RemoveOptions {
    pub fn new() -> RemoveOptions {
        RemoveOptions::default()
    }

    pub fn transacting(mut self, transaction: &Transaction) -> RemoveOptions {
        self.transacting = Some(transaction.clone());
        self
    }
}
