use super::*;

/// SQL text passed through verbatim. Each `?` binds the next parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprRaw {
    pub sql: String,
    pub params: Vec<Value>,
}

impl ExprRaw {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Number of bind markers in the SQL text.
    pub fn markers(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl From<ExprRaw> for Expr {
    fn from(value: ExprRaw) -> Self {
        Expr::Raw(value)
    }
}
