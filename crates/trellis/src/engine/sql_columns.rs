use super::{traverse_record, Cx, FetchPlan, Visit};
use crate::{query::Row, record::Record, Result};

use trellis_core::{
    schema::{Mapping, MappingId},
    stmt::Value,
};

/// Fills the readable SQL columns of every node under `records`.
///
/// Each node gets its own query selecting the column expressions, keyed by
/// the node's physical key.
pub(super) async fn populate(
    cx: Cx<'_>,
    mapping: &Mapping,
    records: &mut [Record],
    plan: &FetchPlan,
) -> Result<()> {
    let mut collect = Collect {
        plan,
        targets: vec![],
    };

    for record in records.iter_mut() {
        traverse_record(cx.schema, mapping, record, &mut collect)?;
    }

    if collect.targets.is_empty() {
        return Ok(());
    }

    let queries: Vec<_> = collect
        .targets
        .iter()
        .map(|target| {
            let mapping = cx.schema.mapping(target.mapping);
            let mut query = cx
                .scoped(mapping)
                .where_eq(mapping.physical_key(), target.key.clone());

            for name in &target.columns {
                if let Some(get) = mapping.column(name).and_then(|column| column.get.as_deref()) {
                    query = query.select_raw(get, name);
                }
            }

            query.first()
        })
        .collect();
    let rows = futures::future::try_join_all(queries).await?;

    let mut assign = Assign {
        plan,
        rows: rows.into_iter(),
    };

    for record in records.iter_mut() {
        traverse_record(cx.schema, mapping, record, &mut assign)?;
    }

    Ok(())
}

struct Target {
    mapping: MappingId,
    columns: Vec<String>,
    key: Value,
}

/// Key of a node that has SQL columns to populate.
fn node_key(mapping: &Mapping, record: &Record, columns: &[&str]) -> Option<Value> {
    if columns.is_empty() {
        return None;
    }

    record
        .get(mapping.physical_key())
        .filter(|key| !key.is_null())
        .cloned()
}

struct Collect<'a> {
    plan: &'a FetchPlan,
    targets: Vec<Target>,
}

impl Visit for Collect<'_> {
    fn pre_order(&mut self, mapping: &Mapping, record: &mut Record) -> Result<()> {
        let columns = self.plan.sql_columns_of(mapping);

        if let Some(key) = node_key(mapping, record, &columns) {
            self.targets.push(Target {
                mapping: mapping.id,
                columns: columns.into_iter().map(str::to_string).collect(),
                key,
            });
        }

        Ok(())
    }
}

struct Assign<'a> {
    plan: &'a FetchPlan,
    rows: std::vec::IntoIter<Option<Row>>,
}

impl Visit for Assign<'_> {
    fn pre_order(&mut self, mapping: &Mapping, record: &mut Record) -> Result<()> {
        let columns = self.plan.sql_columns_of(mapping);

        if node_key(mapping, record, &columns).is_none() {
            return Ok(());
        }

        if let Some(Some(row)) = self.rows.next() {
            for (column, value) in row {
                record.set(column, value);
            }
        }

        Ok(())
    }
}
