mod value;
pub(crate) use value::Value;

use rusqlite::Connection as RusqliteConnection;
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};
use trellis_core::{
    async_trait,
    driver::{
        operation::{Batch, Operation, Transaction},
        Capability, Driver, Response,
    },
    stmt, Result,
};
use trellis_sql::Serializer;
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(|err| {
            trellis_core::Error::invalid_connection_url(&url_str, err.to_string())
        })?;

        if url.scheme() != "sqlite" {
            return Err(trellis_core::Error::invalid_connection_url(
                url_str,
                "expected the `sqlite` scheme",
            ));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn trellis_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }

    fn max_connections(&self) -> Option<usize> {
        // Every in-memory connection is its own database
        matches!(self, Self::InMemory).then_some(1)
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection = RusqliteConnection::open_in_memory()
            .map_err(trellis_core::Error::driver_operation_failed)?;

        Ok(Self { connection })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection =
            RusqliteConnection::open(path).map_err(trellis_core::Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    fn exec_batch(&mut self, batch: &Batch) -> Result<Response> {
        tracing::debug!(sql = %batch.sql, "sqlite batch");

        self.connection
            .execute_batch(&batch.sql)
            .map_err(trellis_core::Error::driver_operation_failed)?;

        Ok(Response::count(0))
    }

    fn exec_transaction(&mut self, op: Transaction) -> Result<Response> {
        let sql = Serializer::sqlite().serialize_transaction(&op);
        tracing::debug!(sql = %sql, "sqlite transaction");

        self.connection
            .execute(&sql, [])
            .map_err(trellis_core::Error::driver_operation_failed)?;

        Ok(Response::count(0))
    }

    fn exec_sql(&mut self, stmt: &stmt::Statement) -> Result<Response> {
        let mut params: Vec<stmt::Value> = vec![];
        let sql = Serializer::sqlite().serialize(stmt, &mut params);

        tracing::debug!(sql = %sql, params = params.len(), "sqlite exec");

        let mut prepared = self
            .connection
            .prepare_cached(&sql)
            .map_err(trellis_core::Error::driver_operation_failed)?;

        let params = params.into_iter().map(Value::from).collect::<Vec<_>>();

        if !stmt.returns_rows() {
            let count = prepared
                .execute(rusqlite::params_from_iter(params.iter()))
                .map_err(trellis_core::Error::driver_operation_failed)?;

            return Ok(Response::count(count as _));
        }

        let columns = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let mut rows = prepared
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(trellis_core::Error::driver_operation_failed)?;

        let mut ret = vec![];

        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut items = Vec::with_capacity(columns.len());

                    for index in 0..columns.len() {
                        items.push(Value::from_sql(row, index)?.into_inner());
                    }

                    ret.push(stmt::ValueRecord::from_vec(items));
                }
                Ok(None) => break,
                Err(err) => {
                    return Err(trellis_core::Error::driver_operation_failed(err));
                }
            }
        }

        Ok(Response::values(stmt::ValueSet::new(columns, ret)))
    }
}

#[async_trait]
impl trellis_core::driver::Connection for Connection {
    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::QuerySql(op) => self.exec_sql(&op.stmt),
            Operation::Batch(batch) => self.exec_batch(&batch),
            Operation::Transaction(op) => self.exec_transaction(op),
        }
    }
}
