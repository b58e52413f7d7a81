//! Connection pooling for database connections.

use std::ops::{Deref, DerefMut};

use trellis_core::{
    driver::{Capability, Driver},
    Connection, Error,
};

/// A connection pool that manages database connections.
#[derive(Debug)]
pub struct Pool {
    inner: deadpool::managed::Pool<Manager>,
    capability: &'static Capability,
}

impl Pool {
    /// Creates a new connection pool from the given driver.
    pub async fn new(
        driver: Box<dyn Driver>,
        max_connections: Option<usize>,
    ) -> crate::Result<Self> {
        let capability = driver.capability();

        let max_connections = match (driver.max_connections(), max_connections) {
            (Some(driver_max), Some(requested)) => Some(driver_max.min(requested)),
            (driver_max, requested) => driver_max.or(requested),
        };

        let mut builder =
            deadpool::managed::Pool::builder(Manager { driver }).runtime(deadpool::Runtime::Tokio1);

        if let Some(max_connections) = max_connections {
            builder = builder.max_size(max_connections);
        }

        let inner = builder.build().map_err(Error::connection_pool)?;

        // Fail fast on a bad configuration
        drop(inner.get().await.map_err(Error::connection_pool)?);

        Ok(Self { inner, capability })
    }

    /// Retrieves a connection from the pool.
    pub async fn get(&self) -> crate::Result<PoolConnection> {
        let connection = self.inner.get().await.map_err(Error::connection_pool)?;
        Ok(PoolConnection { inner: connection })
    }

    /// Returns the database driver's capabilities.
    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    pub fn max_size(&self) -> usize {
        self.inner.status().max_size
    }
}

#[derive(Debug)]
struct Manager {
    driver: Box<dyn Driver>,
}

impl deadpool::managed::Manager for Manager {
    type Type = Box<dyn Connection>;
    type Error = crate::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.driver.connect().await
    }

    async fn recycle(
        &self,
        _obj: &mut Self::Type,
        _metrics: &deadpool::managed::Metrics,
    ) -> deadpool::managed::RecycleResult<Self::Error> {
        Ok(())
    }
}

/// A connection retrieved from a pool.
///
/// When dropped, the connection is returned to the pool for reuse.
#[derive(Debug)]
pub struct PoolConnection {
    inner: deadpool::managed::Object<Manager>,
}

impl Deref for PoolConnection {
    type Target = Box<dyn Connection>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PoolConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
