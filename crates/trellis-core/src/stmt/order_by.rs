use super::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderBy {
    /// Order by a column
    Column { name: String, direction: Direction },

    /// Order rows by the position of `column` within `values`. Rows whose
    /// value is not listed sort last.
    Position { column: String, values: Vec<Value> },
}

impl OrderBy {
    pub fn asc(name: impl Into<String>) -> Self {
        Self::Column {
            name: name.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self::Column {
            name: name.into(),
            direction: Direction::Desc,
        }
    }

    pub fn position(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::Position {
            column: column.into(),
            values,
        }
    }
}
