//! Uncompiled mapping descriptors.
//!
//! Descriptors are built in code or deserialized from JSON:
//!
//! ```json
//! {
//!   "tableName": "cars",
//!   "columns": ["id", "name", { "name": "spec", "type": "json" }],
//!   "relations": [
//!     {
//!       "name": "parts",
//!       "type": "hasMany",
//!       "references": { "mapping": "Part", "cascade": true, "orphanRemoval": true }
//!     }
//!   ],
//!   "discriminator": "deleted_at IS NULL",
//!   "onDelete": { "deleted_at": { "raw": "CURRENT_TIMESTAMP" } }
//! }
//! ```

use super::ColumnTy;
use crate::stmt::{Assignments, Expr, Value};
use crate::{Error, Result};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDef {
    #[serde(default)]
    pub table_name: Option<String>,

    #[serde(default = "default_identified_by")]
    pub identified_by: String,

    #[serde(default)]
    pub columns: Vec<ColumnDef>,

    #[serde(default)]
    pub relations: Vec<RelationDef>,

    #[serde(default, deserialize_with = "deserialize_discriminator")]
    pub discriminator: Option<Expr>,

    #[serde(default, deserialize_with = "deserialize_patch")]
    pub on_delete: Option<Assignments>,

    #[serde(default)]
    pub keep_history: bool,

    #[serde(default)]
    pub history_columns: HistoryColumnsDef,

    #[serde(default)]
    pub history_change_check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ColumnRepr")]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnTy,
    pub get: Option<String>,
    pub set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryColumnsDef {
    #[serde(default = "default_revision_id")]
    pub revision_id: String,

    #[serde(default = "default_parent_id")]
    pub parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationDef {
    pub name: String,

    /// One of `hasOne`, `hasMany`, `belongsTo`. Checked when the mapping is
    /// registered.
    #[serde(rename = "type")]
    pub ty: String,

    pub references: ReferenceDef,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDef {
    /// Registered name of the related mapping
    pub mapping: String,

    /// Domain type name of the related records
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,

    /// Foreign key column, defaults to `snake_case(relation) + "_id"`
    #[serde(default)]
    pub mapped_by: Option<String>,

    /// Referenced column, defaults to the referenced mapping's identifier
    #[serde(default)]
    pub identifies: Option<String>,

    #[serde(default)]
    pub orphan_removal: bool,

    #[serde(default)]
    pub cascade: bool,

    #[serde(default)]
    pub save_sequential: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default, rename = "type")]
        ty: ColumnTy,
        #[serde(default)]
        get: Option<String>,
        #[serde(default)]
        set: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatchValue {
    Raw { raw: String },
    Value(serde_json::Value),
}

fn default_identified_by() -> String {
    "id".to_string()
}

fn default_revision_id() -> String {
    "revision_id".to_string()
}

fn default_parent_id() -> String {
    "parent_id".to_string()
}

fn deserialize_discriminator<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Expr>, D::Error>
where
    D: Deserializer<'de>,
{
    let sql = Option::<String>::deserialize(deserializer)?;
    Ok(sql.map(Expr::raw))
}

fn deserialize_patch<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Assignments>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(patch) = Option::<IndexMap<String, PatchValue>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    Ok(Some(
        patch
            .into_iter()
            .map(|(column, value)| {
                let expr = match value {
                    PatchValue::Raw { raw } => Expr::raw(raw),
                    PatchValue::Value(json) => Expr::Value(Value::from_json(json)),
                };
                (column, expr)
            })
            .collect(),
    ))
}

impl MappingDef {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            identified_by: default_identified_by(),
            columns: vec![],
            relations: vec![],
            discriminator: None,
            on_delete: None,
            keep_history: false,
            history_columns: HistoryColumnsDef::default(),
            history_change_check: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let def: MappingDef = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }

    pub fn from_value(json: serde_json::Value) -> Result<Self> {
        let def: MappingDef = serde_json::from_value(json)?;
        def.validate()?;
        Ok(def)
    }

    pub fn identified_by(mut self, column: impl Into<String>) -> Self {
        self.identified_by = column.into();
        self
    }

    /// Declares regular columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .extend(columns.into_iter().map(|name| ColumnDef::regular(name)));
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn discriminator(mut self, expr: Expr) -> Self {
        self.discriminator = Some(expr);
        self
    }

    /// Discriminator given as a raw SQL predicate.
    pub fn discriminator_sql(self, sql: impl Into<String>) -> Self {
        self.discriminator(Expr::raw(sql))
    }

    pub fn on_delete(mut self, patch: Assignments) -> Self {
        self.on_delete = Some(patch);
        self
    }

    pub fn keep_history(mut self) -> Self {
        self.keep_history = true;
        self
    }

    pub fn history_columns(
        mut self,
        revision_id: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        self.history_columns = HistoryColumnsDef {
            revision_id: revision_id.into(),
            parent_id: parent_id.into(),
        };
        self
    }

    pub fn history_change_check(mut self) -> Self {
        self.history_change_check = true;
        self
    }

    /// Checks what can be checked without the other mappings.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.table_name.as_deref(), Some(name) if !name.is_empty()) {
            return Err(Error::missing_required_option("tableName"));
        }

        for relation in &self.relations {
            relation.ty.parse::<super::RelationTy>()?;
        }

        Ok(())
    }
}

impl ColumnDef {
    pub fn regular(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnTy::Regular,
            get: None,
            set: None,
        }
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self {
            ty: ColumnTy::Json,
            ..Self::regular(name)
        }
    }

    /// A computed column without expressions. Add them with
    /// [`ColumnDef::get`] and [`ColumnDef::set`].
    pub fn sql(name: impl Into<String>) -> Self {
        Self {
            ty: ColumnTy::Sql,
            ..Self::regular(name)
        }
    }

    pub fn get(mut self, sql: impl Into<String>) -> Self {
        self.get = Some(sql.into());
        self
    }

    pub fn set(mut self, sql: impl Into<String>) -> Self {
        self.set = Some(sql.into());
        self
    }
}

impl From<ColumnRepr> for ColumnDef {
    fn from(value: ColumnRepr) -> Self {
        match value {
            ColumnRepr::Name(name) => ColumnDef::regular(name),
            ColumnRepr::Full { name, ty, get, set } => ColumnDef { name, ty, get, set },
        }
    }
}

impl Default for HistoryColumnsDef {
    fn default() -> Self {
        Self {
            revision_id: default_revision_id(),
            parent_id: default_parent_id(),
        }
    }
}

impl RelationDef {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            references: ReferenceDef::new(mapping),
        }
    }

    pub fn has_one(name: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self::new(name, "hasOne", mapping)
    }

    pub fn has_many(name: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self::new(name, "hasMany", mapping)
    }

    pub fn belongs_to(name: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self::new(name, "belongsTo", mapping)
    }

    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.references.type_name = Some(type_name.into());
        self
    }

    pub fn mapped_by(mut self, column: impl Into<String>) -> Self {
        self.references.mapped_by = Some(column.into());
        self
    }

    pub fn identifies(mut self, column: impl Into<String>) -> Self {
        self.references.identifies = Some(column.into());
        self
    }

    pub fn cascade(mut self) -> Self {
        self.references.cascade = true;
        self
    }

    pub fn orphan_removal(mut self) -> Self {
        self.references.orphan_removal = true;
        self
    }

    pub fn save_sequential(mut self) -> Self {
        self.references.save_sequential = true;
        self
    }
}

impl ReferenceDef {
    pub fn new(mapping: impl Into<String>) -> Self {
        Self {
            mapping: mapping.into(),
            type_name: None,
            mapped_by: None,
            identifies: None,
            orphan_removal: false,
            cascade: false,
            save_sequential: false,
        }
    }
}
