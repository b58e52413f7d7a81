use super::{Db, Pool, Shared, DEFAULT_FETCH_CHUNK_SIZE};
use crate::Result;

use trellis_core::{driver::Driver, Error};

use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Builder {
    /// Connection URL, resolved to a built-in driver
    url: Option<String>,

    /// Explicit driver, takes precedence over the URL
    driver: Option<Box<dyn Driver>>,

    max_connections: Option<usize>,

    fetch_chunk_size: Option<usize>,
}

impl Builder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn driver(mut self, driver: impl Driver) -> Self {
        self.driver = Some(Box::new(driver));
        self
    }

    /// Caps the pool size. The driver's own limit wins when lower.
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Identifiers per batched lookup, 1000 by default.
    pub fn fetch_chunk_size(mut self, fetch_chunk_size: usize) -> Self {
        self.fetch_chunk_size = Some(fetch_chunk_size);
        self
    }

    pub async fn connect(self) -> Result<Db> {
        let driver = match (self.driver, self.url) {
            (Some(driver), _) => driver,
            (None, Some(url)) => super::driver_for_url(&url)?,
            (None, None) => return Err(Error::missing_required_option("url")),
        };

        let pool = Pool::new(driver, self.max_connections).await?;

        Ok(Db {
            shared: Arc::new(Shared {
                pool,
                fetch_chunk_size: self.fetch_chunk_size.unwrap_or(DEFAULT_FETCH_CHUNK_SIZE),
            }),
        })
    }
}
