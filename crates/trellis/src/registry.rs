use crate::{entity::EntityRepository, Db, Repository, Result};

use trellis_core::{
    schema::{self, MappingDef},
    Error, Schema,
};

use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Named mapping descriptors, each bound to a named database context.
///
/// Descriptors may reference mappings registered later. The whole set is
/// compiled on first use and recompiled after further registrations.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    builder: schema::Builder,

    /// Mapping name to context name
    contexts: IndexMap<String, String>,

    /// Context name to database
    dbs: IndexMap<String, Db>,

    compiled: Option<Arc<Schema>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Registers `def` under `name`, to be used with the database bound to
    /// `context`.
    pub fn register(
        &self,
        name: impl Into<String>,
        context: impl Into<String>,
        def: MappingDef,
    ) -> Result<()> {
        let name = name.into();
        let mut inner = self.lock();

        inner.builder.register(name.clone(), def)?;
        inner.contexts.insert(name, context.into());
        inner.compiled = None;

        Ok(())
    }

    /// Registers every descriptor of a JSON object keyed by mapping name.
    pub fn load_json(&self, context: &str, json: &str) -> Result<()> {
        let defs: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;

        for (name, def) in defs {
            let def = MappingDef::from_value(def)
                .map_err(|err| err.context(trellis_core::err!("mapping `{name}`")))?;
            self.register(name, context, def)?;
        }

        Ok(())
    }

    /// Binds a context name to a database.
    pub fn context(&self, name: impl Into<String>, db: Db) {
        self.lock().dbs.insert(name.into(), db);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().builder.contains(name)
    }

    /// The compiled schema of everything registered so far.
    pub fn schema(&self) -> Result<Arc<Schema>> {
        let mut inner = self.lock();

        if let Some(schema) = &inner.compiled {
            return Ok(schema.clone());
        }

        let schema = Arc::new(inner.builder.build()?);
        tracing::debug!(mappings = schema.len(), "compiled mapping registry");

        inner.compiled = Some(schema.clone());
        Ok(schema)
    }

    /// A repository for the mapping registered as `name`.
    pub fn repository(&self, name: &str) -> Result<Repository> {
        let schema = self.schema()?;
        let mapping = schema.mapping_by_name(name)?.id;

        let inner = self.lock();
        let context = inner
            .contexts
            .get(name)
            .ok_or_else(|| Error::unregistered_mapping(name))?;
        let db = inner
            .dbs
            .get(context)
            .cloned()
            .ok_or_else(|| Error::missing_required_option(format!("context `{context}`")))?;

        Ok(Repository::new(schema, mapping, db))
    }

    /// A repository reading and writing `T` values for the mapping
    /// registered as `name`.
    pub fn entity<T>(&self, name: &str) -> Result<EntityRepository<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        Ok(EntityRepository::new(self.repository(name)?))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
