mod collection;
pub use collection::Collection;

mod related;
pub use related::Related;

use crate::{query::Row, Result};

use trellis_core::{
    schema::{Mapping, RELATION_PREFIX},
    stmt::Value,
};

use indexmap::IndexMap;

/// One row of a mapped table plus whatever related rows were loaded with
/// it.
///
/// Relations are keyed `relation_<name>`. `previous` holds the attributes as
/// they were last read from or written to storage.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record {
    pub(crate) attributes: IndexMap<String, Value>,
    pub(crate) relations: IndexMap<String, Related>,
    pub(crate) previous: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    /// Builds a persisted record from a fetched row. JSON columns are parsed
    /// from their stored text.
    pub fn from_row(mapping: &Mapping, row: Row) -> Result<Record> {
        let mut attributes = IndexMap::with_capacity(row.len());

        for (column, value) in row {
            let value = if mapping.is_json_column(&column) {
                value.from_json_text()?
            } else {
                value
            };
            attributes.insert(column, value);
        }

        let mut record = Record {
            attributes,
            ..Record::default()
        };
        record.mark_persisted();
        Ok(record)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    /// The column value, `Null` when absent.
    pub fn value(&self, column: &str) -> &Value {
        const NULL: &Value = &Value::Null;
        self.attributes.get(column).unwrap_or(NULL)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Record {
        self.attributes.insert(column.into(), value.into());
        self
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Record {
        self.set(column, value);
        self
    }

    pub fn unset(&mut self, column: &str) -> Option<Value> {
        self.attributes.shift_remove(column)
    }

    pub fn has(&self, column: &str) -> bool {
        self.attributes.contains_key(column)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// True when the record carries no column values.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The non-null identifier of the record under `mapping`.
    pub fn id(&self, mapping: &Mapping) -> Option<&Value> {
        self.get(&mapping.identified_by)
            .filter(|value| !value.is_null())
    }

    pub fn is_new(&self, mapping: &Mapping) -> bool {
        self.id(mapping).is_none()
    }

    /// The value `column` had when the record was last persisted.
    pub fn previous(&self, column: &str) -> Option<&Value> {
        self.previous.get(column)
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.previous = self.attributes.clone();
    }

    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relations.get(&relation_key(name))
    }

    pub fn related_mut(&mut self, name: &str) -> Option<&mut Related> {
        self.relations.get_mut(&relation_key(name))
    }

    pub fn set_related(&mut self, name: &str, related: impl Into<Related>) -> &mut Record {
        self.relations.insert(relation_key(name), related.into());
        self
    }

    pub fn with_related(mut self, name: &str, related: impl Into<Related>) -> Record {
        self.set_related(name, related);
        self
    }

    /// Removes the relation slot entirely, so saves leave the relation
    /// alone.
    pub fn unset_related(&mut self, name: &str) -> Option<Related> {
        self.relations.shift_remove(&relation_key(name))
    }

    /// The loaded singular relation `name`.
    pub fn one(&self, name: &str) -> Option<&Record> {
        self.related(name).and_then(Related::as_one)
    }

    pub fn one_mut(&mut self, name: &str) -> Option<&mut Record> {
        self.related_mut(name).and_then(Related::as_one_mut)
    }

    /// The loaded collection relation `name`.
    pub fn many(&self, name: &str) -> Option<&Collection> {
        self.related(name).and_then(Related::as_many)
    }

    pub fn many_mut(&mut self, name: &str) -> Option<&mut Collection> {
        self.related_mut(name).and_then(Related::as_many_mut)
    }

    /// Loaded relation slots by key.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &Related)> {
        self.relations.iter().map(|(key, related)| (key.as_str(), related))
    }
}

pub(crate) fn relation_key(name: &str) -> String {
    if name.starts_with(RELATION_PREFIX) {
        name.to_string()
    } else {
        format!("{RELATION_PREFIX}{name}")
    }
}
