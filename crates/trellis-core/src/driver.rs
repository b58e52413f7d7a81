mod capability;
pub use capability::Capability;

pub mod operation;
pub use operation::Operation;

mod response;
pub use response::{Response, Rows};

use crate::{async_trait, Result};

use std::{borrow::Cow, fmt::Debug};

#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Connection URL the driver was configured with.
    fn url(&self) -> Cow<'_, str>;

    /// Describes what the database backend supports.
    fn capability(&self) -> &'static Capability;

    /// Opens a new connection.
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    /// Upper bound on pooled connections, if the backend imposes one.
    fn max_connections(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Execute a database operation
    async fn exec(&mut self, op: Operation) -> Result<Response>;
}
