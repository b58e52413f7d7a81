mod builder;
pub use builder::Builder;

mod connect;
pub use connect::driver_for_url;

mod pool;
pub use pool::{Pool, PoolConnection};

mod transaction;
pub use transaction::Transaction;

use crate::{query::Query, Result};

use trellis_core::{
    driver::{
        operation::{Batch, Operation},
        Capability, Rows,
    },
    stmt,
};

use std::sync::Arc;

/// Default number of identifiers per batched lookup.
pub const DEFAULT_FETCH_CHUNK_SIZE: usize = 1000;

/// A handle to a database: a connection pool plus settings shared by every
/// repository bound to it. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Db {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    pool: Pool,

    /// Identifiers per batched lookup
    fetch_chunk_size: usize,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Connects with default settings.
    pub async fn connect(url: &str) -> Result<Db> {
        Db::builder().url(url).connect().await
    }

    /// Starts a query against `table`.
    pub fn query(&self, table: impl Into<String>) -> Query {
        Query::new(self.clone(), table)
    }

    /// Starts a transaction pinned to one pooled connection.
    pub async fn transaction(&self) -> Result<Transaction> {
        let connection = self.shared.pool.get().await?;
        Transaction::start(connection).await
    }

    /// Executes a statement, on the transaction's connection when one is
    /// given.
    pub async fn exec(
        &self,
        stmt: impl Into<stmt::Statement>,
        transacting: Option<&Transaction>,
    ) -> Result<Rows> {
        let stmt = stmt.into();
        tracing::debug!(
            table = stmt.table(),
            transacting = transacting.is_some(),
            "exec statement"
        );
        self.exec_op(stmt.into(), transacting).await
    }

    /// Executes parameterless SQL such as schema DDL.
    pub async fn execute_batch(&self, sql: impl Into<String>) -> Result<()> {
        self.exec_op(Batch::new(sql).into(), None).await?;
        Ok(())
    }

    async fn exec_op(&self, op: Operation, transacting: Option<&Transaction>) -> Result<Rows> {
        let response = match transacting {
            Some(transaction) => transaction.exec(op).await?,
            None => self.shared.pool.get().await?.exec(op).await?,
        };

        Ok(response.rows)
    }

    pub fn capability(&self) -> &'static Capability {
        self.shared.pool.capability()
    }

    /// Identifiers per batched lookup, bounded by the backend's parameter
    /// limit.
    pub fn fetch_chunk_size(&self) -> usize {
        self.shared
            .fetch_chunk_size
            .min(self.capability().max_bind_params)
            .max(1)
    }

    pub fn pool(&self) -> &Pool {
        &self.shared.pool
    }
}
