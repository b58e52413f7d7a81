//! Plain domain values over records.
//!
//! A record converts to a JSON document with camelCase keys: columns become
//! fields, relations become nested objects or arrays, JSON columns are
//! inlined. [`EntityRepository`] runs the repository operations in terms of
//! any `Serialize + DeserializeOwned` type with that shape.

use crate::{
    db::Transaction,
    record::{Collection, Record, Related},
    FetchOptions, RemoveOptions, Repository, Result, SaveOptions,
};

use trellis_core::{
    err,
    schema::{Mapping, RELATION_PREFIX},
    stmt::Value,
    Schema,
};

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value as Json};
use std::{future::Future, marker::PhantomData};

/// Converts a record and its loaded relations into a document.
pub fn to_document(schema: &Schema, mapping: &Mapping, record: &Record) -> Json {
    let mut document = Map::new();

    for (column, value) in record.attributes() {
        document.insert(column.to_lower_camel_case(), value.to_json());
    }

    for (key, related) in record.relations() {
        let Some(relation) = mapping.relation_by_key(key) else {
            continue;
        };
        let target = relation.target(schema);

        let value = match related {
            Related::Null => Json::Null,
            Related::One(record) => to_document(schema, target, record),
            Related::Many(collection) => Json::Array(
                collection
                    .iter()
                    .map(|record| to_document(schema, target, record))
                    .collect(),
            ),
            Related::Scalar(value) => value.to_json(),
        };

        let name = key.strip_prefix(RELATION_PREFIX).unwrap_or(key);
        document.insert(name.to_lower_camel_case(), value);
    }

    Json::Object(document)
}

/// Converts a document back into a record.
///
/// Keys naming a relation become relation slots: objects are single
/// records, arrays collections, `null` an empty relation and anything else
/// a scalar. Keys naming no column or relation are ignored.
pub fn from_document(schema: &Schema, mapping: &Mapping, document: &Json) -> Result<Record> {
    let Json::Object(fields) = document else {
        return Err(err!(
            "expected an object for mapping `{}`, found {document}",
            mapping.name
        ));
    };

    let mut record = Record::new();

    for (key, value) in fields {
        let column = key.to_snake_case();

        let relation = mapping
            .relation(&column)
            .or_else(|| mapping.relation(key));

        if let Some(relation) = relation {
            let target = relation.target(schema);
            let related = match value {
                Json::Null => Related::Null,
                Json::Object(_) => Related::from(from_document(schema, target, value)?),
                Json::Array(items) if items.iter().all(Json::is_object) => Related::Many(
                    items
                        .iter()
                        .map(|item| from_document(schema, target, item))
                        .collect::<Result<Collection>>()?,
                ),
                value => Related::Scalar(Value::from_json(value.clone())),
            };

            record.set_related(&relation.name, related);
            continue;
        }

        let value = match value {
            Json::Null => Value::Null,
            value if mapping.is_json_column(&column) => Value::Json(value.clone()),
            value => Value::from_json(value.clone()),
        };

        if mapping.column(&column).is_some() || mapping.regular_columns.contains(&column) {
            record.set(column, value);
        }
    }

    Ok(record)
}

/// Options for [`EntityRepository`] operations.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions {
    pub transacting: Option<Transaction>,

    /// Run the operation in its own transaction when none is given
    pub transactional: bool,

    pub exclude: Vec<String>,

    pub columns: Vec<String>,
}

impl EntityOptions {
    pub fn new() -> EntityOptions {
        EntityOptions::default()
    }

    pub fn transacting(mut self, transaction: &Transaction) -> EntityOptions {
        self.transacting = Some(transaction.clone());
        self
    }

    pub fn transactional(mut self) -> EntityOptions {
        self.transactional = true;
        self
    }

    pub fn exclude<I, S>(mut self, paths: I) -> EntityOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> EntityOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    fn fetch(&self, transacting: Option<Transaction>) -> FetchOptions {
        FetchOptions {
            transacting,
            exclude: self.exclude.clone(),
            columns: self.columns.clone(),
        }
    }
}

/// Find, save and remove in terms of a domain type `T`.
#[derive(Debug)]
pub struct EntityRepository<T> {
    repository: Repository,
    _p: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityRepository<T> {
    fn clone(&self) -> Self {
        EntityRepository::new(self.repository.clone())
    }
}

impl<T> EntityRepository<T> {
    pub fn new(repository: Repository) -> EntityRepository<T> {
        EntityRepository {
            repository,
            _p: PhantomData,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}

impl<T: Serialize + DeserializeOwned> EntityRepository<T> {
    pub async fn find_one(
        &self,
        id: impl Into<Value>,
        options: &EntityOptions,
    ) -> Result<Option<T>> {
        let id = id.into();

        self.run(options, |transacting| async move {
            let found = self
                .repository
                .find_one(id, &options.fetch(transacting))
                .await?;

            found.map(|record| self.to_entity(&record)).transpose()
        })
        .await
    }

    pub async fn find_all(&self, ids: Vec<Value>, options: &EntityOptions) -> Result<Vec<T>> {
        self.run(options, |transacting| async move {
            let found = self
                .repository
                .find_all(ids, &options.fetch(transacting))
                .await?;

            found.iter().map(|record| self.to_entity(record)).collect()
        })
        .await
    }

    /// Saves `entity` and returns it as stored, with generated identifiers
    /// and keys filled in.
    pub async fn save(&self, entity: &T, options: &EntityOptions) -> Result<T> {
        let mut record = self.to_record(entity)?;

        self.run(options, |transacting| async move {
            let save = SaveOptions {
                transacting,
                method: None,
            };
            self.repository.save(&mut record, &save).await?;
            self.to_entity(&record)
        })
        .await
    }

    pub async fn remove(&self, entity: &T, options: &EntityOptions) -> Result<T> {
        let mut record = self.to_record(entity)?;

        self.run(options, |transacting| async move {
            self.repository
                .remove(&mut record, &RemoveOptions { transacting })
                .await?;
            self.to_entity(&record)
        })
        .await
    }

    pub fn to_record(&self, entity: &T) -> Result<Record> {
        let document = serde_json::to_value(entity)?;
        from_document(self.repository.schema(), self.repository.mapping(), &document)
    }

    pub fn to_entity(&self, record: &Record) -> Result<T> {
        let document = to_document(self.repository.schema(), self.repository.mapping(), record);
        Ok(serde_json::from_value(document)?)
    }

    /// Runs `op` with the caller's transaction, or in a new one when the
    /// options ask for it. A new transaction commits on success and rolls
    /// back on failure.
    async fn run<'a, F, Fut, R>(&'a self, options: &'a EntityOptions, op: F) -> Result<R>
    where
        F: FnOnce(Option<Transaction>) -> Fut,
        Fut: Future<Output = Result<R>> + 'a,
    {
        if options.transacting.is_some() || !options.transactional {
            return op(options.transacting.clone()).await;
        }

        let transaction = self.repository.db().transaction().await?;

        match op(Some(transaction.clone())).await {
            Ok(value) => {
                transaction.commit().await?;
                Ok(value)
            }
            Err(err) => {
                transaction.rollback().await?;
                Err(err)
            }
        }
    }
}
