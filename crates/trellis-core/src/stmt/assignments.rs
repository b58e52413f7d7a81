use super::{Expr, Value};

use indexmap::IndexMap;

/// Ordered `column = expr` pairs for INSERT and UPDATE statements.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Assignments {
    assignments: IndexMap<String, Expr>,
}

impl Assignments {
    pub fn set(&mut self, column: impl Into<String>, expr: impl Into<Expr>) {
        self.assignments.insert(column.into(), expr.into());
    }

    pub fn get(&self, column: &str) -> Option<&Expr> {
        self.assignments.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Expr> {
        self.assignments.shift_remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.assignments.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Expr)> {
        self.assignments.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.assignments.keys().map(String::as_str)
    }

    /// Plain values of this patch, skipping raw SQL assignments.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.assignments
            .iter()
            .filter_map(|(column, expr)| expr.as_value().map(|value| (column.as_str(), value)))
    }
}

impl<K: Into<String>, E: Into<Expr>> FromIterator<(K, E)> for Assignments {
    fn from_iter<T: IntoIterator<Item = (K, E)>>(iter: T) -> Self {
        let mut assignments = Assignments::default();
        for (column, expr) in iter {
            assignments.set(column, expr);
        }
        assignments
    }
}

impl IntoIterator for Assignments {
    type Item = (String, Expr);
    type IntoIter = indexmap::map::IntoIter<String, Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.into_iter()
    }
}
