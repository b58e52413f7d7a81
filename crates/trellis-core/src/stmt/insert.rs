use super::Assignments;

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,

    /// Column values. Empty inserts a row of defaults.
    pub values: Assignments,

    /// Columns to return from the inserted row
    pub returning: Option<Vec<String>>,
}

impl Insert {
    pub fn new(table: impl Into<String>, values: Assignments) -> Self {
        Self {
            table: table.into(),
            values,
            returning: None,
        }
    }
}
