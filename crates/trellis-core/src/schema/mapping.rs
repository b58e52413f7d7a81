use super::{Column, History, Relation};
use crate::stmt::{Assignments, Expr};

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingId(pub usize);

/// A compiled mapping descriptor: how one entity type maps onto a table.
#[derive(Debug, Clone)]
pub struct Mapping {
    /// Uniquely identifies the mapping within the schema
    pub id: MappingId,

    /// Name the mapping was registered under
    pub name: String,

    /// Table name, possibly schema-qualified
    pub table: String,

    /// Identifying column. Not unique when history is kept.
    pub identified_by: String,

    /// Declared columns, in declaration order
    pub columns: IndexMap<String, Column>,

    pub relations: Vec<Relation>,

    /// Standing filter applied to every read and write
    pub discriminator: Option<Expr>,

    /// When set, removing a record applies this patch instead of deleting
    pub on_delete: Option<Assignments>,

    pub history: Option<History>,

    /// Every non-SQL column a record of this mapping carries
    pub regular_columns: Vec<String>,

    pub sql_columns: SqlColumns,

    /// `regular_columns`, table qualified, for eager-load selection
    pub qualified_regular_column_names: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SqlColumns {
    /// SQL columns with a `get` expression
    pub readable: Vec<String>,

    /// SQL columns with a `set` template
    pub writable: Vec<String>,
}

impl Mapping {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    /// Relation whose record slot is `key`.
    pub fn relation_by_key(&self, key: &str) -> Option<&Relation> {
        self.relations.iter().find(|relation| relation.key == key)
    }

    pub fn is_json_column(&self, name: &str) -> bool {
        self.column(name).is_some_and(Column::is_json)
    }

    pub fn is_sql_column(&self, name: &str) -> bool {
        self.column(name).is_some_and(Column::is_sql)
    }

    pub fn keeps_history(&self) -> bool {
        self.history.is_some()
    }

    /// Column addressing exactly one physical row: the revision column when
    /// history is kept, otherwise the identifying column.
    pub fn physical_key(&self) -> &str {
        match &self.history {
            Some(history) => &history.revision_id,
            None => &self.identified_by,
        }
    }

    /// Restricts a select to the latest revision of every record: rows no
    /// other revision names as its parent. `None` when history is not kept.
    pub fn latest_revision_filter(&self) -> Option<Expr> {
        let history = self.history.as_ref()?;

        Some(Expr::raw(format!(
            "{revision} NOT IN (SELECT prior.{parent} FROM {table} AS prior \
             WHERE prior.{parent} IS NOT NULL)",
            revision = self.qualify(&history.revision_id),
            parent = history.parent_id,
            table = self.table,
        )))
    }

    /// Qualifies a column with this mapping's table.
    pub fn qualify(&self, column: &str) -> String {
        format!("{}.{}", self.table, column)
    }

    /// Columns compared by the history change check: every regular column
    /// except the revision bookkeeping.
    pub fn tracked_columns(&self) -> impl Iterator<Item = &str> {
        self.regular_columns
            .iter()
            .map(String::as_str)
            .filter(|column| match &self.history {
                Some(history) => !history.is_history_column(column),
                None => true,
            })
    }

    /// Relations whose foreign key lives on this table.
    pub fn belongs_to(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(|relation| relation.is_belongs_to())
    }

    /// Relations whose foreign key lives on the related table.
    pub fn has_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(|relation| relation.is_key_on_related())
    }
}

impl From<&Mapping> for MappingId {
    fn from(value: &Mapping) -> Self {
        value.id
    }
}
