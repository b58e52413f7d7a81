use super::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Delete(Delete),
    Insert(Insert),
    Select(Select),
    Update(Update),
}

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Statement::Delete(stmt) => &stmt.table,
            Statement::Insert(stmt) => &stmt.table,
            Statement::Select(stmt) => &stmt.table,
            Statement::Update(stmt) => &stmt.table,
        }
    }

    /// True when executing the statement yields rows rather than a count.
    pub fn returns_rows(&self) -> bool {
        match self {
            Statement::Select(_) => true,
            Statement::Insert(stmt) => stmt.returning.is_some(),
            Statement::Update(stmt) => stmt.returning.is_some(),
            Statement::Delete(_) => false,
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, Statement::Select(_))
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Statement::Insert(_))
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Statement::Update(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Statement::Delete(_))
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Statement::Select(value)
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Statement::Insert(value)
    }
}

impl From<Update> for Statement {
    fn from(value: Update) -> Self {
        Statement::Update(value)
    }
}

impl From<Delete> for Statement {
    fn from(value: Delete) -> Self {
        Statement::Delete(value)
    }
}
