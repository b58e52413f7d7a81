pub mod db;
pub use db::{Db, Transaction};

mod engine;
pub use engine::{traverse, traverse_record, Customize, EagerEntry, EagerLoad, Visit};

pub mod entity;
pub use entity::{EntityOptions, EntityRepository};

pub mod query;
pub use query::{Query, Row};

pub mod record;
pub use record::{Collection, Record, Related};

pub mod registry;
pub use registry::Registry;

pub mod repository;
pub use repository::{FetchOptions, RemoveOptions, Repository, SaveMethod, SaveOptions};

pub use trellis_core::{
    driver, patch,
    schema::{self, ColumnDef, MappingDef, RelationDef},
    stmt, Error, Result, Schema,
};
