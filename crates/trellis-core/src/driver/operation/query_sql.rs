use super::Operation;

use crate::stmt;

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The SQL statement to execute
    pub stmt: stmt::Statement,
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}

impl From<stmt::Statement> for Operation {
    fn from(value: stmt::Statement) -> Self {
        Self::QuerySql(QuerySql { stmt: value })
    }
}
