
pub use db_test::DbTest;

mod exec_log;
pub use exec_log::ExecLog;

mod logging_driver;
pub use logging_driver::{DriverOp, LoggingDriver};

pub use setup::{Setup, SetupSqlite};

use std::sync::Once;
use trellis::{Db, Registry};

/// Installs a `tracing` subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A registry with `db` bound to the `default` context.
pub fn registry(db: &Db) -> Registry {
    let registry = Registry::new();
    registry.context("default", db.clone());
    registry
}
