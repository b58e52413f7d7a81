use super::{Collection, Record};

use trellis_core::stmt::Value;

/// The content of a relation slot.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Related {
    /// Loaded, and nothing is related
    #[default]
    Null,

    One(Box<Record>),

    Many(Collection),

    /// A plain value where a record was expected. Deep save and remove
    /// reject it.
    Scalar(Value),
}

impl Related {
    pub fn is_null(&self) -> bool {
        matches!(self, Related::Null)
    }

    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Related::One(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    pub fn as_one_mut(&mut self) -> Option<&mut Record> {
        match self {
            Related::One(record) => Some(record.as_mut()),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&Collection> {
        match self {
            Related::Many(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_many_mut(&mut self) -> Option<&mut Collection> {
        match self {
            Related::Many(collection) => Some(collection),
            _ => None,
        }
    }

    /// Name of the runtime shape, reported by errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Related::Null => "Null",
            Related::One(_) => "Record",
            Related::Many(_) => "Collection",
            Related::Scalar(value) => value.type_name(),
        }
    }
}

impl From<Record> for Related {
    fn from(value: Record) -> Self {
        Related::One(Box::new(value))
    }
}

impl From<Option<Record>> for Related {
    fn from(value: Option<Record>) -> Self {
        value.map(Related::from).unwrap_or_default()
    }
}

impl From<Collection> for Related {
    fn from(value: Collection) -> Self {
        Related::Many(value)
    }
}

impl From<Vec<Record>> for Related {
    fn from(value: Vec<Record>) -> Self {
        Related::Many(Collection::from(value))
    }
}

impl From<Value> for Related {
    fn from(value: Value) -> Self {
        Related::Scalar(value)
    }
}
