use super::*;

/// A column reference. A dotted name (`schema.table.column`) is quoted
/// segment by segment by the serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprColumn {
    pub name: String,
}

impl ExprColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The unqualified column name.
    pub fn unqualified(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl From<ExprColumn> for Expr {
    fn from(value: ExprColumn) -> Self {
        Expr::Column(value)
    }
}
