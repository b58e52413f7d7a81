mod eager;
pub use eager::{Customize, EagerEntry, EagerLoad};

mod fetch;
pub(crate) use fetch::{fetch, FetchPlan};

mod remove;
pub(crate) use remove::remove;

mod save;
pub(crate) use save::save;

mod sql_columns;

mod traverse;
pub use traverse::{traverse, traverse_record, Visit};

use crate::{
    db::Transaction,
    query::Query,
    record::{Record, Related},
    Db, Result,
};

use trellis_core::{
    schema::{Mapping, SavePolicy},
    stmt, Schema,
};

use std::future::Future;

/// Everything a deep operation needs: the compiled schema, the database and
/// the caller's transaction, if any.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cx<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) db: &'a Db,
    pub(crate) transacting: Option<&'a Transaction>,
}

impl<'a> Cx<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        db: &'a Db,
        transacting: Option<&'a Transaction>,
    ) -> Cx<'a> {
        Cx {
            schema,
            db,
            transacting,
        }
    }

    /// A query on the mapping's table, pinned to the transaction.
    pub(crate) fn query(&self, mapping: &Mapping) -> Query {
        self.db.query(&mapping.table).transacting(self.transacting)
    }

    /// Like [`query`](Cx::query), restricted by the mapping's discriminator.
    pub(crate) fn scoped(&self, mapping: &Mapping) -> Query {
        let query = self.query(mapping);

        match &mapping.discriminator {
            Some(discriminator) => query.filter(discriminator.clone()),
            None => query,
        }
    }

    pub(crate) fn select(&self, select: stmt::Select) -> Query {
        Query::from_select(self.db.clone(), select).transacting(self.transacting)
    }
}

/// Awaits `tasks` together, or one after another for the sequential
/// policy. Stops at the first error.
pub(crate) async fn run_all<T, F>(policy: SavePolicy, tasks: Vec<F>) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>>,
{
    match policy {
        SavePolicy::Concurrent => futures::future::try_join_all(tasks).await,
        SavePolicy::Sequential => {
            let mut out = vec![];
            for task in tasks {
                out.push(task.await?);
            }
            Ok(out)
        }
    }
}

/// The records held by a relation slot, or `None` for a scalar.
pub(crate) fn members(related: &mut Related) -> Option<Vec<&mut Record>> {
    match related {
        Related::Null => Some(vec![]),
        Related::One(record) => Some(vec![record.as_mut()]),
        Related::Many(collection) => Some(collection.iter_mut().collect()),
        Related::Scalar(_) => None,
    }
}
