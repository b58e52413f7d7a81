#[derive(Debug)]
pub struct Capability {
    /// Supports `RETURNING` on INSERT and UPDATE statements.
    pub returning_from_mutation: bool,

    /// Maximum number of bind parameters in a single statement.
    pub max_bind_params: usize,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        returning_from_mutation: true,
        max_bind_params: 32_766,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        max_bind_params: 65_535,
        ..Self::SQLITE
    };
}
