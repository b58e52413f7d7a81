use super::{fetch, members, remove, run_all, Cx};
use crate::{
    record::{Record, Related},
    repository::{RelationOptions, SaveMethod},
    Result,
};

use trellis_core::{
    patch,
    schema::{History, Mapping, Relation},
    stmt::{Assignments, Expr, ExprRaw, Value},
    Error,
};

use async_recursion::async_recursion;

/// Persists `record` and the loaded relations under it.
///
/// Records the key points at (`belongsTo`) are saved first so their keys
/// can be copied onto the record; records that point back at it are saved
/// after it exists. Orphaned rows are removed last.
#[async_recursion]
pub(crate) async fn save<'a>(
    cx: Cx<'a>,
    mapping: &'a Mapping,
    record: &'a mut Record,
    method: Option<SaveMethod>,
) -> Result<()> {
    tracing::debug!(mapping = %mapping.name, new = record.is_new(mapping), "deep save");

    save_belongs_to(cx, mapping, record).await?;
    persist(cx, mapping, record, method).await?;
    save_key_on_related(cx, mapping, record).await?;
    remove_orphans(cx, mapping, record).await?;

    record.mark_persisted();
    Ok(())
}

async fn save_belongs_to(cx: Cx<'_>, mapping: &Mapping, record: &mut Record) -> Result<()> {
    let Record {
        attributes,
        relations,
        ..
    } = record;

    let tasks: Vec<_> = relations
        .iter_mut()
        .filter_map(|(key, related)| {
            let relation = mapping
                .relation_by_key(key)
                .filter(|relation| relation.is_belongs_to())?;
            Some(save_referenced(cx, relation, related))
        })
        .collect();

    let saved = futures::future::try_join_all(tasks).await?;
    for (relation, key) in saved.into_iter().flatten() {
        attributes.insert(relation.mapped_by.clone(), key);
    }

    Ok(())
}

/// Saves the record a `belongsTo` relation points at, when cascading, and
/// returns the key to store on the owner.
async fn save_referenced<'a>(
    cx: Cx<'a>,
    relation: &'a Relation,
    related: &mut Related,
) -> Result<Option<(&'a Relation, Value)>> {
    let target = relation.target(cx.schema);

    match related {
        Related::Null => Ok(None),
        Related::Scalar(value) => Err(Error::unsaveable_related_value(
            &relation.name,
            value.type_name(),
        )),
        Related::One(referenced) => {
            if relation.cascade {
                save(cx, target, referenced, None).await?;
            }

            Ok(referenced
                .get(&relation.identifies)
                .filter(|key| !key.is_null())
                .cloned()
                .map(|key| (relation, key)))
        }
        Related::Many(collection) => {
            if relation.cascade {
                let tasks = collection
                    .iter_mut()
                    .map(|member| save(cx, target, member, None))
                    .collect();
                run_all(relation.save_policy, tasks).await?;
            }
            Ok(None)
        }
    }
}

/// Writes the record's own row. SQL columns are kept out of the regular
/// write, applied through their setters afterwards, and put back on the
/// record unchanged.
async fn persist(
    cx: Cx<'_>,
    mapping: &Mapping,
    record: &mut Record,
    method: Option<SaveMethod>,
) -> Result<()> {
    let stripped: Vec<(String, Value)> = mapping
        .columns
        .values()
        .filter(|column| column.is_sql())
        .filter_map(|column| Some((column.name.clone(), record.unset(&column.name)?)))
        .collect();

    let result = persist_row(cx, mapping, record, method, &stripped).await;

    for (column, value) in stripped {
        record.set(column, value);
    }

    result
}

async fn persist_row(
    cx: Cx<'_>,
    mapping: &Mapping,
    record: &mut Record,
    method: Option<SaveMethod>,
    sql_values: &[(String, Value)],
) -> Result<()> {
    let written = match &mapping.history {
        Some(history) => save_revision(cx, mapping, history, record).await?,
        None => {
            let insert = match method {
                Some(SaveMethod::Insert) => true,
                Some(SaveMethod::Update) => false,
                None => record.is_new(mapping),
            };

            if insert {
                insert_row(cx, mapping, record).await?;
            } else {
                update_row(cx, mapping, record).await?;
            }
            true
        }
    };

    if written {
        write_sql_columns(cx, mapping, record, sql_values).await?;
    }

    Ok(())
}

/// Appends a new revision unless the change check finds the content
/// already stored in the revision being replaced. Returns whether a row was
/// written.
async fn save_revision(
    cx: Cx<'_>,
    mapping: &Mapping,
    history: &History,
    record: &mut Record,
) -> Result<bool> {
    if history.change_check && !record.is_new(mapping) {
        let replaced = record
            .get(&history.revision_id)
            .filter(|revision| !revision.is_null())
            .cloned();

        let mut query = cx.scoped(mapping);
        if let Some(revision) = replaced {
            query = query.where_eq(&history.revision_id, revision);
        } else if let Some(latest) = mapping.latest_revision_filter() {
            // No revision on the record: compare with the latest one
            query = query.filter(latest);
        }

        for column in mapping.tracked_columns() {
            query = query.where_eq(column, stored(mapping, column, record.value(column))?);
        }

        if query.count().await? > 0 {
            tracing::debug!(mapping = %mapping.name, "content unchanged; no revision written");
            return Ok(false);
        }
    }

    if let Some(revision) = record
        .unset(&history.revision_id)
        .filter(|revision| !revision.is_null())
    {
        record.set(&history.parent_id, revision);
    }

    insert_row(cx, mapping, record).await?;
    Ok(true)
}

async fn insert_row(cx: Cx<'_>, mapping: &Mapping, record: &mut Record) -> Result<()> {
    let mut values = Assignments::default();

    for column in &mapping.regular_columns {
        let Some(value) = record.get(column) else {
            continue;
        };

        if value.is_null() && is_generated(mapping, column) {
            continue;
        }

        values.set(column, stored(mapping, column, value)?);
    }

    let query = cx.query(mapping);

    if !cx.db.capability().returning_from_mutation {
        query.insert(values).await?;
        return Ok(());
    }

    let row = query
        .insert_returning(values, mapping.regular_columns.clone())
        .await?;

    for (column, value) in row {
        let value = if mapping.is_json_column(&column) {
            value.from_json_text()?
        } else {
            value
        };
        record.set(column, value);
    }

    Ok(())
}

async fn update_row(cx: Cx<'_>, mapping: &Mapping, record: &mut Record) -> Result<()> {
    let key_column = mapping.physical_key();

    let Some(key) = record.get(key_column).filter(|key| !key.is_null()).cloned() else {
        return Err(Error::record_not_found(format!(
            "table={} key=NULL",
            mapping.table
        )));
    };

    let mut patch = Assignments::default();
    for column in &mapping.regular_columns {
        if column == key_column {
            continue;
        }

        if let Some(value) = record.get(column) {
            patch.set(column, stored(mapping, column, value)?);
        }
    }

    if patch.is_empty() {
        return Ok(());
    }

    let updated = cx
        .scoped(mapping)
        .where_eq(key_column, key.clone())
        .update(patch)
        .await?;

    if updated == 0 {
        return Err(Error::record_not_found(format!(
            "table={} key={key}",
            mapping.table
        )));
    }

    Ok(())
}

/// Applies the setter expression of every writable SQL column that had a
/// value on the record.
async fn write_sql_columns(
    cx: Cx<'_>,
    mapping: &Mapping,
    record: &Record,
    sql_values: &[(String, Value)],
) -> Result<()> {
    let assignments: Assignments = sql_values
        .iter()
        .filter_map(|(name, value)| {
            let set = mapping.column(name)?.set.as_deref()?;
            let mut raw = ExprRaw::new(set, vec![]);
            raw.params = vec![value.clone(); raw.markers()];
            Some((name.clone(), Expr::from(raw)))
        })
        .collect();

    if assignments.is_empty() {
        return Ok(());
    }

    let key_column = mapping.physical_key();
    let Some(key) = record.get(key_column).filter(|key| !key.is_null()).cloned() else {
        return Ok(());
    };

    cx.scoped(mapping)
        .where_eq(key_column, key)
        .update(assignments)
        .await?;

    Ok(())
}

async fn save_key_on_related(cx: Cx<'_>, mapping: &Mapping, record: &mut Record) -> Result<()> {
    let Record {
        attributes,
        relations,
        ..
    } = record;

    let tasks: Vec<_> = relations
        .iter_mut()
        .filter_map(|(key, related)| {
            let relation = mapping
                .relation_by_key(key)
                .filter(|relation| relation.is_key_on_related())?;
            let owner = attributes
                .get(&relation.identifies)
                .cloned()
                .unwrap_or_default();
            Some(save_referencing(cx, relation, related, owner))
        })
        .collect();

    futures::future::try_join_all(tasks).await?;
    Ok(())
}

/// Saves the records of a `hasOne`/`hasMany` relation. Without cascade only
/// their key is written.
async fn save_referencing(
    cx: Cx<'_>,
    relation: &Relation,
    related: &mut Related,
    owner: Value,
) -> Result<()> {
    let target = relation.target(cx.schema);
    let found = related.type_name();

    let Some(members) = members(related) else {
        return Err(Error::unsaveable_related_value(&relation.name, found));
    };

    if members.is_empty() {
        return Ok(());
    }

    if relation.cascade {
        let tasks = members
            .into_iter()
            .map(|member| {
                member.set(&relation.mapped_by, owner.clone());
                save(cx, target, member, None)
            })
            .collect();
        run_all(relation.save_policy, tasks).await?;
    } else {
        tracing::info!(
            relation = %relation.name,
            "cascade on 1:n relations have no effect on content, only the key is persisted"
        );

        let tasks = members
            .into_iter()
            .map(|member| stamp_key(cx, target, relation, member, owner.clone()))
            .collect();
        run_all(relation.save_policy, tasks).await?;
    }

    Ok(())
}

/// Points `member` at its owner, writing the key column alone when the
/// member is already stored.
async fn stamp_key(
    cx: Cx<'_>,
    target: &Mapping,
    relation: &Relation,
    member: &mut Record,
    owner: Value,
) -> Result<()> {
    member.set(&relation.mapped_by, owner.clone());

    let key_column = target.physical_key();
    let Some(key) = member.get(key_column).filter(|key| !key.is_null()).cloned() else {
        return Ok(());
    };

    cx.scoped(target)
        .where_eq(key_column, key)
        .update(patch!(relation.mapped_by.clone() => owner.clone()))
        .await?;

    member.previous.insert(relation.mapped_by.clone(), owner);
    Ok(())
}

async fn remove_orphans(cx: Cx<'_>, mapping: &Mapping, record: &mut Record) -> Result<()> {
    for relation in mapping.relations.iter().filter(|relation| relation.orphan_removal) {
        if relation.is_belongs_to() {
            remove_unreferenced(cx, mapping, relation, record).await?;
        } else {
            remove_detached(cx, relation, record).await?;
        }
    }

    Ok(())
}

/// Removes rows of a `hasOne`/`hasMany` relation that point at the owner,
/// or at nothing, and are no longer in the loaded relation.
async fn remove_detached(cx: Cx<'_>, relation: &Relation, record: &Record) -> Result<()> {
    let Some(related) = record.relations.get(&relation.key) else {
        return Ok(());
    };

    let target = relation.target(cx.schema);
    let survivors = match related {
        Related::Null => vec![],
        Related::One(member) => member.id(target).cloned().into_iter().collect(),
        Related::Many(collection) => collection.ids(&target.identified_by),
        Related::Scalar(_) => return Ok(()),
    };

    let Some(owner) = record
        .get(&relation.identifies)
        .filter(|owner| !owner.is_null())
        .cloned()
    else {
        return Ok(());
    };

    let plan = RelationOptions::new(cx.schema, target).build()?;
    let mut select = plan.select(target);
    select.and_filter(Expr::or(
        Expr::column_eq(&relation.mapped_by, owner),
        Expr::is_null(Expr::column(&relation.mapped_by)),
    ));
    select.and_filter(Expr::not_in_list(
        Expr::column(&target.identified_by),
        survivors,
    ));

    let mut orphans = fetch(cx, target, select, &plan.fetch).await?;
    remove_all(cx, target, &mut orphans).await
}

/// Removes the row a `belongsTo` relation used to point at once the owner
/// no longer references it, then clears the owner's key.
async fn remove_unreferenced(
    cx: Cx<'_>,
    mapping: &Mapping,
    relation: &Relation,
    record: &mut Record,
) -> Result<()> {
    let detached = matches!(record.relations.get(&relation.key), Some(Related::Null));
    let current = record
        .get(&relation.mapped_by)
        .filter(|key| !key.is_null())
        .cloned();

    if current.is_some() && !detached {
        return Ok(());
    }

    let Some(referenced) = current.or_else(|| {
        record
            .previous(&relation.mapped_by)
            .filter(|key| !key.is_null())
            .cloned()
    }) else {
        return Ok(());
    };

    let target = relation.target(cx.schema);
    let plan = RelationOptions::new(cx.schema, target).build()?;
    let mut select = if relation.identifies == target.physical_key() {
        plan.select_any_revision(target)
    } else {
        plan.select(target)
    };
    select.and_filter(Expr::column_eq(&relation.identifies, referenced));

    let mut orphans = fetch(cx, target, select, &plan.fetch).await?;
    remove_all(cx, target, &mut orphans).await?;

    record.set(&relation.mapped_by, Value::Null);

    let key_column = mapping.physical_key();
    if let Some(key) = record.get(key_column).filter(|key| !key.is_null()).cloned() {
        cx.scoped(mapping)
            .where_eq(key_column, key)
            .update(patch!(relation.mapped_by.clone() => Value::Null))
            .await?;
    }

    Ok(())
}

async fn remove_all(cx: Cx<'_>, mapping: &Mapping, records: &mut [Record]) -> Result<()> {
    let tasks: Vec<_> = records
        .iter_mut()
        .map(|record| remove(cx, mapping, record))
        .collect();
    futures::future::try_join_all(tasks).await?;
    Ok(())
}

/// Columns the database fills in when they are left out of an insert.
fn is_generated(mapping: &Mapping, column: &str) -> bool {
    column == mapping.identified_by
        || mapping
            .history
            .as_ref()
            .is_some_and(|history| history.revision_id == column)
}

/// The stored form of a column value: JSON columns are serialized.
fn stored(mapping: &Mapping, column: &str, value: &Value) -> Result<Value> {
    if mapping.is_json_column(column) {
        value.to_json_text()
    } else {
        Ok(value.clone())
    }
}
