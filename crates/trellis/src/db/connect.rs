use crate::Result;

use trellis_core::{driver::Driver, Error};
use url::Url;

/// Resolves a connection URL to one of the built-in drivers.
pub fn driver_for_url(url: &str) -> Result<Box<dyn Driver>> {
    let parsed = Url::parse(url)
        .map_err(|err| Error::invalid_connection_url(url, err.to_string()))?;

    match parsed.scheme() {
        "sqlite" => connect_sqlite(url),
        scheme => Err(Error::invalid_connection_url(
            url,
            format!("unsupported scheme `{scheme}`"),
        )),
    }
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(url: &str) -> Result<Box<dyn Driver>> {
    Ok(Box::new(trellis_driver_sqlite::Sqlite::new(url)?))
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_url: &str) -> Result<Box<dyn Driver>> {
    Err(anyhow::anyhow!("`sqlite` feature not enabled").into())
}
