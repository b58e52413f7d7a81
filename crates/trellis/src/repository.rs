mod options;
pub use options::{FetchOptions, RemoveOptions, SaveMethod, SaveOptions};

mod relation_options;
pub(crate) use relation_options::{Plan, RelationOptions};

use crate::{
    db::Transaction,
    engine::{self, Cx},
    query::Query,
    record::{Collection, Record, Related},
    Db, Result,
};

use trellis_core::{
    schema::{Mapping, MappingId, Relation, RelationTy},
    stmt::{self, Expr, OrderBy, Returning, Value},
    Error, Schema,
};

use std::{mem, sync::Arc};

/// Deep fetch, save and remove for the records of one mapping.
#[derive(Debug, Clone)]
pub struct Repository {
    schema: Arc<Schema>,
    mapping: MappingId,
    db: Db,
}

impl Repository {
    pub fn new(schema: Arc<Schema>, mapping: MappingId, db: Db) -> Repository {
        Repository { schema, mapping, db }
    }

    pub fn mapping(&self) -> &Mapping {
        self.schema.mapping(self.mapping)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    /// A query over the mapping's table, restricted by its discriminator.
    pub fn query(&self) -> Query {
        self.cx(None).scoped(self.mapping())
    }

    /// Loads the record with the given identifier and its relation tree.
    pub async fn find_one(
        &self,
        id: impl Into<Value>,
        options: &FetchOptions,
    ) -> Result<Option<Record>> {
        let mapping = self.mapping();
        let plan = self.plan(options)?;

        let mut select = plan.select(mapping);
        select.and_filter(Expr::column_eq(mapping.qualify(&mapping.identified_by), id));
        select.limit = Some(1);

        let cx = self.cx(options.transacting.as_ref());
        let found = engine::fetch(cx, mapping, select, &plan.fetch).await?;
        Ok(found.into_iter().next())
    }

    /// Loads the records with the given identifiers, in the order of `ids`.
    /// Identifiers are looked up in chunks of the fetch chunk size.
    pub async fn find_all(&self, ids: Vec<Value>, options: &FetchOptions) -> Result<Collection> {
        if ids.is_empty() {
            return Ok(Collection::new());
        }

        let mapping = self.mapping();
        let plan = self.plan(options)?;
        let cx = self.cx(options.transacting.as_ref());
        let column = mapping.qualify(&mapping.identified_by);

        let chunks = ids.chunks(self.db.fetch_chunk_size()).map(|chunk| {
            let mut select = plan.select(mapping);
            select.and_filter(Expr::in_list(Expr::column(&column), chunk.to_vec()));
            select
                .order_by
                .push(OrderBy::position(&column, chunk.to_vec()));

            engine::fetch(cx, mapping, select, &plan.fetch)
        });

        let found = futures::future::try_join_all(chunks).await?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Loads every record matching `filter`.
    pub async fn find_where(
        &self,
        filter: impl Into<Expr>,
        options: &FetchOptions,
    ) -> Result<Collection> {
        let mapping = self.mapping();
        let plan = self.plan(options)?;

        let mut select = plan.select(mapping);
        select.and_filter(filter);

        engine::fetch(self.cx(options.transacting.as_ref()), mapping, select, &plan.fetch).await
    }

    /// Loads the records `select` returns. A select without an explicit
    /// column list gets the one the options produce.
    pub async fn fetch(
        &self,
        mut select: stmt::Select,
        options: &FetchOptions,
    ) -> Result<Collection> {
        let mapping = self.mapping();
        let plan = self.plan(options)?;

        if select.returning == Returning::All {
            select.returning = Returning::Items(plan.root.clone());
        }

        if let Some(discriminator) = &mapping.discriminator {
            select.and_filter(discriminator.clone());
        }

        if let Some(latest) = mapping.latest_revision_filter() {
            select.and_filter(latest);
        }

        engine::fetch(self.cx(options.transacting.as_ref()), mapping, select, &plan.fetch).await
    }

    pub async fn save(&self, record: &mut Record, options: &SaveOptions) -> Result<()> {
        engine::save(
            self.cx(options.transacting.as_ref()),
            self.mapping(),
            record,
            options.method,
        )
        .await
    }

    /// Saves every record concurrently.
    pub async fn save_all(&self, records: &mut [Record], options: &SaveOptions) -> Result<()> {
        let cx = self.cx(options.transacting.as_ref());
        let mapping = self.mapping();

        futures::future::try_join_all(
            records
                .iter_mut()
                .map(|record| engine::save(cx, mapping, record, options.method)),
        )
        .await?;

        Ok(())
    }

    pub async fn remove(&self, record: &mut Record, options: &RemoveOptions) -> Result<()> {
        engine::remove(self.cx(options.transacting.as_ref()), self.mapping(), record).await
    }

    /// Removes every record concurrently.
    pub async fn remove_all(&self, records: &mut [Record], options: &RemoveOptions) -> Result<()> {
        let cx = self.cx(options.transacting.as_ref());
        let mapping = self.mapping();

        futures::future::try_join_all(
            records
                .iter_mut()
                .map(|record| engine::remove(cx, mapping, record)),
        )
        .await?;

        Ok(())
    }

    /// Adds `member` to the relation `name` of `owner` and points the key
    /// column at it, in memory only.
    pub fn attach(&self, owner: &mut Record, name: &str, mut member: Record) -> Result<()> {
        let relation = self.relation(name)?;

        match relation.ty {
            RelationTy::BelongsTo => {
                let key = member.value(&relation.identifies).clone();
                owner.set(&relation.mapped_by, key);
                owner.set_related(name, member);
            }
            RelationTy::HasOne => {
                member.set(&relation.mapped_by, owner.value(&relation.identifies).clone());
                owner.set_related(name, member);
            }
            RelationTy::HasMany => {
                member.set(&relation.mapped_by, owner.value(&relation.identifies).clone());

                match owner.many_mut(name) {
                    Some(collection) => {
                        collection.add(member);
                    }
                    None => {
                        owner.set_related(name, vec![member]);
                    }
                }
            }
        }

        Ok(())
    }

    /// Takes the related record identified by `id` out of the relation
    /// `name` and clears the key linking the two, in memory only.
    pub fn detach(&self, owner: &mut Record, name: &str, id: &Value) -> Result<Option<Record>> {
        let relation = self.relation(name)?;
        let target = relation.target(&self.schema);

        let mut detached = if relation.is_has_many() {
            owner
                .many_mut(name)
                .and_then(|collection| collection.remove(&target.identified_by, id))
        } else {
            let linked = owner
                .one(name)
                .is_some_and(|record| record.get(&target.identified_by) == Some(id));

            match owner.related_mut(name).filter(|_| linked).map(mem::take) {
                Some(Related::One(record)) => Some(*record),
                _ => None,
            }
        };

        if relation.is_belongs_to() {
            if detached.is_some() {
                owner.set(&relation.mapped_by, Value::Null);
            }
        } else if let Some(record) = &mut detached {
            record.set(&relation.mapped_by, Value::Null);
        }

        Ok(detached)
    }

    fn relation(&self, name: &str) -> Result<&Relation> {
        let mapping = self.mapping();
        let name = name.strip_prefix(trellis_core::schema::RELATION_PREFIX).unwrap_or(name);

        mapping.relation(name).ok_or_else(|| {
            Error::invalid_mapping(&mapping.name, format!("unknown relation `{name}`"))
        })
    }

    fn plan(&self, options: &FetchOptions) -> Result<Plan> {
        RelationOptions::new(&self.schema, self.mapping())
            .exclude(&options.exclude)
            .columns(&options.columns)
            .build()
    }

    fn cx<'a>(&'a self, transacting: Option<&'a Transaction>) -> Cx<'a> {
        Cx::new(&self.schema, &self.db, transacting)
    }
}
