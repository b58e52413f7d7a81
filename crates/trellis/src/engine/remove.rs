use super::{members, run_all, Cx};
use crate::{
    record::{Record, Related},
    Result,
};

use trellis_core::{patch, schema::Mapping, schema::Relation, stmt::Value, Error};

use async_recursion::async_recursion;

/// Removes `record` and, where cascading, the loaded records related to it.
///
/// Records pointing at this one are removed or detached before its row
/// goes; records it points at are removed after. A mapping with an
/// `onDelete` patch is soft deleted.
#[async_recursion]
pub(crate) async fn remove<'a>(
    cx: Cx<'a>,
    mapping: &'a Mapping,
    record: &'a mut Record,
) -> Result<()> {
    tracing::debug!(mapping = %mapping.name, "deep remove");

    let tasks: Vec<_> = record
        .relations
        .iter_mut()
        .filter_map(|(key, related)| {
            let relation = mapping
                .relation_by_key(key)
                .filter(|relation| relation.is_key_on_related())?;
            Some(drop_referencing(cx, relation, related))
        })
        .collect();
    futures::future::try_join_all(tasks).await?;

    remove_row(cx, mapping, record).await?;

    let tasks: Vec<_> = record
        .relations
        .iter_mut()
        .filter_map(|(key, related)| {
            let relation = mapping
                .relation_by_key(key)
                .filter(|relation| relation.is_belongs_to() && relation.cascade)?;
            Some(drop_referenced(cx, relation, related))
        })
        .collect();
    futures::future::try_join_all(tasks).await?;

    Ok(())
}

/// Removes the records of a `hasOne`/`hasMany` relation, or clears their key
/// when the relation does not cascade.
async fn drop_referencing(
    cx: Cx<'_>,
    relation: &Relation,
    related: &mut Related,
) -> Result<()> {
    let target = relation.target(cx.schema);
    let found = related.type_name();

    let Some(members) = members(related) else {
        return Err(Error::unremovable_related_value(&relation.name, found));
    };

    if relation.cascade {
        let tasks = members
            .into_iter()
            .map(|member| remove(cx, target, member))
            .collect();
        run_all(relation.save_policy, tasks).await?;
        return Ok(());
    }

    let ids: Vec<Value> = members
        .iter()
        .filter_map(|member| member.id(target))
        .cloned()
        .collect();

    if !ids.is_empty() {
        cx.scoped(target)
            .where_in(&target.identified_by, ids)
            .update(patch!(relation.mapped_by.clone() => Value::Null))
            .await?;
    }

    for member in members {
        member.set(&relation.mapped_by, Value::Null);
    }

    Ok(())
}

async fn drop_referenced(cx: Cx<'_>, relation: &Relation, related: &mut Related) -> Result<()> {
    let target = relation.target(cx.schema);
    let found = related.type_name();

    let Some(members) = members(related) else {
        return Err(Error::unremovable_related_value(&relation.name, found));
    };

    let tasks = members
        .into_iter()
        .map(|member| remove(cx, target, member))
        .collect();
    run_all(relation.save_policy, tasks).await?;

    Ok(())
}

/// Deletes every row carrying the record's identifier, or applies the
/// mapping's `onDelete` patch to them.
async fn remove_row(cx: Cx<'_>, mapping: &Mapping, record: &mut Record) -> Result<()> {
    let Some(id) = record.id(mapping).cloned() else {
        return Ok(());
    };

    let query = cx.scoped(mapping).where_eq(&mapping.identified_by, id);

    match &mapping.on_delete {
        Some(on_delete) => {
            query.update(on_delete.clone()).await?;

            for (column, value) in on_delete.values() {
                record.set(column, value.clone());
            }
        }
        None => {
            query.delete().await?;
        }
    }

    Ok(())
}
