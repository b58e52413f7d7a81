use super::Cx;
use crate::{record::Record, record::Related, Result};

use trellis_core::{
    schema::{Mapping, Relation, RELATION_PREFIX},
    stmt::{self, Expr, Returning, SelectItem, Value},
    Error,
};

use async_recursion::async_recursion;
use indexmap::{IndexMap, IndexSet};
use std::{fmt, sync::Arc};

/// Adjusts the select that loads one relation path.
pub type Customize = Arc<dyn Fn(&mut stmt::Select) + Send + Sync>;

/// Relation paths to load along with the root records.
#[derive(Clone, Default)]
pub struct EagerLoad {
    entries: Vec<EagerEntry>,
}

/// One dot separated relation path, e.g. `relation_parts.relation_maker`.
#[derive(Clone)]
pub struct EagerEntry {
    /// Relation names, without the `relation_` prefix
    pub path: Vec<String>,

    pub customize: Option<Customize>,
}

impl EagerLoad {
    pub fn new() -> EagerLoad {
        EagerLoad::default()
    }

    pub fn push(&mut self, path: &str) -> &mut EagerLoad {
        self.entries.push(EagerEntry::new(path, None));
        self
    }

    pub fn push_with(
        &mut self,
        path: &str,
        customize: impl Fn(&mut stmt::Select) + Send + Sync + 'static,
    ) -> &mut EagerLoad {
        self.entries
            .push(EagerEntry::new(path, Some(Arc::new(customize))));
        self
    }

    pub fn entries(&self) -> &[EagerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The paths in their prefixed form.
    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(EagerEntry::key).collect()
    }
}

impl EagerEntry {
    pub fn new(path: &str, customize: Option<Customize>) -> EagerEntry {
        let path = path
            .split('.')
            .map(|segment| segment.strip_prefix(RELATION_PREFIX).unwrap_or(segment))
            .map(str::to_string)
            .collect();

        EagerEntry { path, customize }
    }

    /// `relation_a.relation_b`
    pub fn key(&self) -> String {
        self.path
            .iter()
            .map(|name| format!("{RELATION_PREFIX}{name}"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Debug for EagerLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl fmt::Debug for EagerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerEntry")
            .field("path", &self.key())
            .field("customized", &self.customize.is_some())
            .finish()
    }
}

/// Relation paths arranged as a tree, one node per relation.
struct Level<'e> {
    name: &'e str,
    customize: Option<&'e Customize>,
    children: Vec<Level<'e>>,
}

fn levels(entries: &[EagerEntry]) -> Vec<Level<'_>> {
    let mut roots: Vec<Level<'_>> = vec![];

    for entry in entries {
        let mut siblings = &mut roots;

        for (depth, name) in entry.path.iter().enumerate() {
            let index = match siblings.iter().position(|level| level.name == name.as_str()) {
                Some(index) => index,
                None => {
                    siblings.push(Level {
                        name: name.as_str(),
                        customize: None,
                        children: vec![],
                    });
                    siblings.len() - 1
                }
            };

            if depth + 1 == entry.path.len() {
                siblings[index].customize = entry.customize.as_ref();
            }

            siblings = &mut siblings[index].children;
        }
    }

    roots
}

/// Loads the relation paths of `eager` onto `records`.
///
/// Every relation of a level is loaded with one batched `IN` query per
/// chunk of keys. Singular relations with no matching row get an empty
/// placeholder record; `hasMany` relations get an empty collection.
pub(crate) async fn load(
    cx: Cx<'_>,
    mapping: &Mapping,
    records: &mut [Record],
    eager: &EagerLoad,
) -> Result<()> {
    if eager.is_empty() || records.is_empty() {
        return Ok(());
    }

    load_levels(cx, mapping, records, &levels(&eager.entries)).await
}

#[async_recursion]
async fn load_levels<'a>(
    cx: Cx<'a>,
    mapping: &'a Mapping,
    records: &'a mut [Record],
    levels: &'a [Level<'a>],
) -> Result<()> {
    let mut tasks = vec![];

    for level in levels {
        let relation = mapping.relation(level.name).ok_or_else(|| {
            Error::invalid_mapping(
                &mapping.name,
                format!("cannot eager load unknown relation `{}`", level.name),
            )
        })?;

        let (owner_column, _) = match_columns(relation);
        let keys: IndexSet<Value> = records
            .iter()
            .filter_map(|record| record.get(owner_column))
            .filter(|value| !value.is_null())
            .cloned()
            .collect();

        tasks.push(async move {
            let loaded = load_relation(cx, relation, keys, level).await?;
            Ok::<_, crate::Error>((relation, loaded))
        });
    }

    for (relation, loaded) in futures::future::try_join_all(tasks).await? {
        attach(relation, records, loaded);
    }

    Ok(())
}

/// `(column on the owner, column on the related row)` that must be equal
/// for two rows to be related.
fn match_columns(relation: &Relation) -> (&str, &str) {
    if relation.is_belongs_to() {
        (relation.mapped_by.as_str(), relation.identifies.as_str())
    } else {
        (relation.identifies.as_str(), relation.mapped_by.as_str())
    }
}

async fn load_relation(
    cx: Cx<'_>,
    relation: &Relation,
    keys: IndexSet<Value>,
    level: &Level<'_>,
) -> Result<Vec<Record>> {
    if keys.is_empty() {
        return Ok(vec![]);
    }

    let target = relation.target(cx.schema);
    let (_, target_column) = match_columns(relation);

    // Columns later levels match on must be fetched too
    let mut required = vec![target_column];
    for child in &level.children {
        if let Some(child) = target.relation(child.name) {
            required.push(match_columns(child).0);
        }
    }

    let keys: Vec<Value> = keys.into_iter().collect();
    let mut loaded = vec![];

    for chunk in keys.chunks(cx.db.fetch_chunk_size()) {
        let mut select = stmt::Select::new(&target.table);

        match level.customize {
            Some(customize) => customize(&mut select),
            None => {
                select.returning = Returning::Items(
                    target
                        .regular_columns
                        .iter()
                        .map(|column| {
                            SelectItem::aliased(Expr::column(target.qualify(column)), column)
                        })
                        .collect(),
                )
            }
        }

        let missing: Vec<&str> = select
            .item_names()
            .map(|names| {
                required
                    .iter()
                    .copied()
                    .filter(|column| !names.contains(column))
                    .collect()
            })
            .unwrap_or_default();

        for column in missing {
            select.push_item(SelectItem::aliased(Expr::column(target.qualify(column)), column));
        }

        select.and_filter(Expr::in_list(
            Expr::column(target.qualify(target_column)),
            chunk.to_vec(),
        ));

        if let Some(discriminator) = &target.discriminator {
            select.and_filter(discriminator.clone());
        }

        // A relation naming a revision loads exactly that revision
        if target_column != target.physical_key() {
            if let Some(latest) = target.latest_revision_filter() {
                select.and_filter(latest);
            }
        }

        for row in cx.select(select).all().await? {
            loaded.push(Record::from_row(target, row)?);
        }
    }

    if !level.children.is_empty() {
        load_levels(cx, target, &mut loaded, &level.children).await?;
    }

    Ok(loaded)
}

fn attach(relation: &Relation, records: &mut [Record], loaded: Vec<Record>) {
    let (owner_column, target_column) = match_columns(relation);

    let mut by_key: IndexMap<&Value, Vec<&Record>> = IndexMap::new();
    for record in &loaded {
        if let Some(key) = record.get(target_column) {
            by_key.entry(key).or_default().push(record);
        }
    }

    for record in records.iter_mut() {
        let matches = record
            .get(owner_column)
            .and_then(|key| by_key.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let related = if relation.is_has_many() {
            Related::from(matches.iter().map(|record| (*record).clone()).collect::<Vec<_>>())
        } else {
            let record = matches.first().map(|record| (*record).clone()).unwrap_or_default();
            Related::from(record)
        };

        record.relations.insert(relation.key.clone(), related);
    }
}
