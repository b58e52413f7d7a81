mod builder;
pub use builder::Builder;

mod column;
pub use column::{Column, ColumnTy};

pub mod def;
pub use def::{ColumnDef, MappingDef, ReferenceDef, RelationDef};

mod history;
pub use history::History;

mod mapping;
pub use mapping::{Mapping, MappingId, SqlColumns};

mod relation;
pub use relation::{Relation, RelationTy, SavePolicy, RELATION_PREFIX};

use crate::{Error, Result};
use indexmap::IndexMap;

/// Compiled mapping descriptors.
///
/// Mappings live in a flat arena and refer to each other by [`MappingId`],
/// so cyclic relation graphs need no shared ownership.
#[derive(Debug, Default)]
pub struct Schema {
    mappings: Vec<Mapping>,

    /// Logical name to arena index
    names: IndexMap<String, MappingId>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Get a mapping by ID
    pub fn mapping(&self, id: impl Into<MappingId>) -> &Mapping {
        self.mappings
            .get(id.into().0)
            .expect("invalid mapping ID")
    }

    /// Get a mapping by its registered name
    pub fn mapping_by_name(&self, name: &str) -> Result<&Mapping> {
        match self.names.get(name) {
            Some(id) => Ok(self.mapping(*id)),
            None => Err(Error::unregistered_mapping(name)),
        }
    }

    pub fn mapping_id(&self, name: &str) -> Option<MappingId> {
        self.names.get(name).copied()
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
