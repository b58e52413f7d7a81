use super::PoolConnection;
use crate::Result;

use trellis_core::{
    driver::{
        operation::{Operation, Transaction as TransactionOp},
        Response,
    },
    Error,
};

use std::sync::Arc;
use tokio::sync::Mutex;

/// An open database transaction.
///
/// The handle pins one pooled connection; every operation given the handle
/// runs on it. Clones share the same transaction. Dropping the last clone
/// before [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback) rolls it back.
#[derive(Debug, Clone)]
pub struct Transaction {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// `None` once the transaction finished
    connection: Mutex<Option<PoolConnection>>,
}

impl Transaction {
    pub(super) async fn start(mut connection: PoolConnection) -> Result<Transaction> {
        connection.exec(TransactionOp::Start.into()).await?;

        Ok(Transaction {
            inner: Arc::new(Inner {
                connection: Mutex::new(Some(connection)),
            }),
        })
    }

    pub(crate) async fn exec(&self, op: Operation) -> Result<Response> {
        let mut connection = self.inner.connection.lock().await;

        match connection.as_mut() {
            Some(connection) => connection.exec(op).await,
            None => Err(Error::transaction_finished()),
        }
    }

    pub async fn commit(&self) -> Result<()> {
        self.finish(TransactionOp::Commit).await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.finish(TransactionOp::Rollback).await
    }

    /// True once committed or rolled back.
    pub async fn is_finished(&self) -> bool {
        self.inner.connection.lock().await.is_none()
    }

    async fn finish(&self, op: TransactionOp) -> Result<()> {
        let Some(mut connection) = self.inner.connection.lock().await.take() else {
            return Err(Error::transaction_finished());
        };

        if let Err(err) = connection.exec(op.into()).await {
            if op == TransactionOp::Commit {
                // Leave the connection clean before it returns to the pool
                let _ = connection.exec(TransactionOp::Rollback.into()).await;
            }
            return Err(err);
        }

        tracing::debug!(?op, "transaction finished");
        Ok(())
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.get_mut().take() else {
            return;
        };

        tracing::warn!("transaction dropped without commit or rollback; rolling back");

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = connection.exec(TransactionOp::Rollback.into()).await {
                    tracing::warn!(%err, "rollback of dropped transaction failed");
                }
            });
        }
    }
}
