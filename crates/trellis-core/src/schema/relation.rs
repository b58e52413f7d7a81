use super::{Mapping, MappingId, Schema};
use crate::Error;

use std::str::FromStr;

/// Prefix of the record slot holding a loaded relation.
pub const RELATION_PREFIX: &str = "relation_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Relation name as declared on the owning mapping
    pub name: String,

    /// Record slot key, `relation_` + name
    pub key: String,

    pub ty: RelationTy,

    /// Mapping of the related records
    pub target: MappingId,

    /// Domain type name of the related records, used by wrappers
    pub type_name: Option<String>,

    /// Foreign key column. Lives on the target table for `hasOne` and
    /// `hasMany`, on the owning table for `belongsTo`.
    pub mapped_by: String,

    /// Column on the referenced side the foreign key points at
    pub identifies: String,

    pub orphan_removal: bool,

    pub cascade: bool,

    pub save_policy: SavePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationTy {
    HasOne,
    HasMany,
    BelongsTo,
}

/// How the members of a related collection are saved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Save all members together and join
    #[default]
    Concurrent,

    /// Save members strictly one at a time, in order
    Sequential,
}

impl Relation {
    pub fn target<'a>(&self, schema: &'a Schema) -> &'a Mapping {
        schema.mapping(self.target)
    }

    /// True when the foreign key lives on the related table.
    pub fn is_key_on_related(&self) -> bool {
        !self.is_belongs_to()
    }

    pub fn is_belongs_to(&self) -> bool {
        self.ty == RelationTy::BelongsTo
    }

    pub fn is_has_many(&self) -> bool {
        self.ty == RelationTy::HasMany
    }

    pub fn is_has_one(&self) -> bool {
        self.ty == RelationTy::HasOne
    }

    /// True when the relation loads a single record.
    pub fn is_singular(&self) -> bool {
        !self.is_has_many()
    }
}

impl RelationTy {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationTy::HasOne => "hasOne",
            RelationTy::HasMany => "hasMany",
            RelationTy::BelongsTo => "belongsTo",
        }
    }
}

impl FromStr for RelationTy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hasOne" => Ok(RelationTy::HasOne),
            "hasMany" => Ok(RelationTy::HasMany),
            "belongsTo" => Ok(RelationTy::BelongsTo),
            other => Err(Error::unsupported_relation_shape(other)),
        }
    }
}

impl core::fmt::Display for RelationTy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
