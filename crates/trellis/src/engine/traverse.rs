use crate::{
    record::{Record, Related},
    Result,
};

use trellis_core::{
    schema::{Mapping, Relation},
    Schema,
};

use std::mem;

/// Callbacks for [`traverse`].
pub trait Visit {
    /// Called for every record before its relations are visited.
    fn pre_order(&mut self, mapping: &Mapping, record: &mut Record) -> Result<()> {
        let _ = (mapping, record);
        Ok(())
    }

    /// Called after a singular related record and its subtree were visited.
    /// Members of a related collection do not trigger it.
    fn post_order(
        &mut self,
        relation: &Relation,
        related: &mut Record,
        parent: &mut Record,
    ) -> Result<()> {
        let _ = (relation, related, parent);
        Ok(())
    }
}

/// Walks a loaded record graph depth first, following the relations
/// `mapping` declares.
///
/// `Null` and scalar slots are skipped. A collection is walked member by
/// member with the same mapping.
pub fn traverse<V>(
    schema: &Schema,
    mapping: &Mapping,
    node: &mut Related,
    visit: &mut V,
) -> Result<()>
where
    V: Visit + ?Sized,
{
    match node {
        Related::Null | Related::Scalar(_) => Ok(()),
        Related::One(record) => traverse_record(schema, mapping, record, visit),
        Related::Many(collection) => {
            for record in collection.iter_mut() {
                traverse_record(schema, mapping, record, visit)?;
            }
            Ok(())
        }
    }
}

/// [`traverse`] starting at a single record.
pub fn traverse_record<V>(
    schema: &Schema,
    mapping: &Mapping,
    record: &mut Record,
    visit: &mut V,
) -> Result<()>
where
    V: Visit + ?Sized,
{
    visit.pre_order(mapping, record)?;

    for relation in &mapping.relations {
        let Some(slot) = record.relations.get_mut(&relation.key) else {
            continue;
        };

        let mut related = mem::take(slot);
        let result = visit_related(schema, relation, &mut related, record, visit);

        if let Some(slot) = record.relations.get_mut(&relation.key) {
            *slot = related;
        }

        result?;
    }

    Ok(())
}

fn visit_related<V>(
    schema: &Schema,
    relation: &Relation,
    related: &mut Related,
    parent: &mut Record,
    visit: &mut V,
) -> Result<()>
where
    V: Visit + ?Sized,
{
    traverse(schema, relation.target(schema), related, visit)?;

    if let Related::One(record) = related {
        visit.post_order(relation, record, parent)?;
    }

    Ok(())
}
