use super::{eager, sql_columns, traverse_record, Cx, EagerLoad, Visit};
use crate::{
    record::{Collection, Record, Related},
    Result,
};

use trellis_core::{
    schema::{Mapping, MappingId},
    stmt,
};

use std::collections::HashMap;

/// What a deep fetch loads beyond the root rows.
#[derive(Debug, Clone, Default)]
pub(crate) struct FetchPlan {
    pub(crate) eager: EagerLoad,

    /// Readable SQL columns to populate, per mapping. `None` populates every
    /// readable column.
    pub(crate) sql_columns: Option<HashMap<MappingId, Vec<String>>>,
}

impl FetchPlan {
    pub(crate) fn sql_columns_of<'a>(&'a self, mapping: &'a Mapping) -> Vec<&'a str> {
        let readable = mapping.sql_columns.readable.iter().map(String::as_str);

        match &self.sql_columns {
            None => readable.collect(),
            Some(selected) => {
                let Some(selected) = selected.get(&mapping.id) else {
                    return vec![];
                };
                readable
                    .filter(|column| selected.iter().any(|name| name == column))
                    .collect()
            }
        }
    }
}

/// Runs `select` against the mapping's table and loads the relation tree of
/// every row.
///
/// Empty placeholders left by the eager loader are stripped, then the
/// readable SQL columns of every node are populated.
pub(crate) async fn fetch(
    cx: Cx<'_>,
    mapping: &Mapping,
    select: stmt::Select,
    plan: &FetchPlan,
) -> Result<Collection> {
    tracing::debug!(mapping = %mapping.name, eager = ?plan.eager.paths(), "deep fetch");

    let mut records = cx
        .select(select)
        .all()
        .await?
        .into_iter()
        .map(|row| Record::from_row(mapping, row))
        .collect::<Result<Vec<_>>>()?;

    if records.is_empty() {
        return Ok(Collection::new());
    }

    eager::load(cx, mapping, &mut records, &plan.eager).await?;

    for record in &mut records {
        traverse_record(cx.schema, mapping, record, &mut StripEmpty)?;
    }

    sql_columns::populate(cx, mapping, &mut records, plan).await?;

    Ok(records.into())
}

/// Drops singular relations whose record carries no columns.
struct StripEmpty;

impl Visit for StripEmpty {
    fn pre_order(&mut self, _mapping: &Mapping, record: &mut Record) -> Result<()> {
        record
            .relations
            .retain(|_, related| !matches!(related, Related::One(related) if related.is_empty()));
        Ok(())
    }
}
