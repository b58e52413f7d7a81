use super::{Assignments, Expr};

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Assignments,
    pub filter: Option<Expr>,
    pub returning: Option<Vec<String>>,
}

impl Update {
    pub fn new(table: impl Into<String>, assignments: Assignments) -> Self {
        Self {
            table: table.into(),
            assignments,
            filter: None,
            returning: None,
        }
    }
}
