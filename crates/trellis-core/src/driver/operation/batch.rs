use super::Operation;

/// Parameterless SQL text, typically schema DDL.
#[derive(Debug, Clone)]
pub struct Batch {
    pub sql: String,
}

impl Batch {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

impl From<Batch> for Operation {
    fn from(value: Batch) -> Self {
        Self::Batch(value)
    }
}
