use crate::{stmt::ValueSet, Result};

#[derive(Debug, Clone)]
pub struct Response {
    pub rows: Rows,
}

#[derive(Debug, Clone)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Rows returned by the operation
    Values(ValueSet),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
        }
    }

    pub fn values(values: ValueSet) -> Self {
        Self {
            rows: Rows::Values(values),
        }
    }

    pub fn empty_values() -> Self {
        Self::values(ValueSet::default())
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }

    /// Rows affected, or rows returned.
    pub fn len(&self) -> u64 {
        match self {
            Rows::Count(count) => *count,
            Rows::Values(values) => values.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_values(self) -> Result<ValueSet> {
        match self {
            Rows::Values(values) => Ok(values),
            Rows::Count(_) => Err(crate::err!("expected rows, the operation returned a count")),
        }
    }
}
