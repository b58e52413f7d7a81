use super::Record;

use trellis_core::stmt::Value;

use std::ops;

/// An ordered set of records, the loaded side of a `hasMany` relation or a
/// multi-row fetch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    pub fn new() -> Collection {
        Collection::default()
    }

    pub fn add(&mut self, record: Record) -> &mut Collection {
        self.records.push(record);
        self
    }

    /// Removes the first member whose `column` equals `id`.
    pub fn remove(&mut self, column: &str, id: &Value) -> Option<Record> {
        let index = self
            .records
            .iter()
            .position(|record| record.get(column) == Some(id))?;
        Some(self.records.remove(index))
    }

    pub fn find(&self, column: &str, id: &Value) -> Option<&Record> {
        self.records.iter().find(|record| record.get(column) == Some(id))
    }

    /// Non-null values of `column` across the members, in order.
    pub fn ids(&self, column: &str) -> Vec<Value> {
        self.records
            .iter()
            .filter_map(|record| record.get(column))
            .filter(|value| !value.is_null())
            .cloned()
            .collect()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl ops::Deref for Collection {
    type Target = [Record];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl ops::DerefMut for Collection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.records
    }
}

impl From<Vec<Record>> for Collection {
    fn from(records: Vec<Record>) -> Self {
        Collection { records }
    }
}

impl FromIterator<Record> for Collection {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Collection {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<Record> for Collection {
    fn extend<T: IntoIterator<Item = Record>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a mut Collection {
    type Item = &'a mut Record;
    type IntoIter = std::slice::IterMut<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter_mut()
    }
}
