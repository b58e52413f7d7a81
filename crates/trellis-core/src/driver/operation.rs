mod batch;
pub use batch::Batch;

mod query_sql;
pub use query_sql::QuerySql;

mod transaction;
pub use transaction::Transaction;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Execute parameterless SQL, one or more statements
    Batch(Batch),

    /// Execute a SQL statement
    QuerySql(QuerySql),

    /// Execute a transaction lifecycle op
    Transaction(Transaction),
}

impl Operation {
    pub fn is_query_sql(&self) -> bool {
        matches!(self, Self::QuerySql(_))
    }

    pub fn as_query_sql(&self) -> Option<&QuerySql> {
        match self {
            Self::QuerySql(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }
}
