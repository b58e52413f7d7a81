use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,

    pub ty: ColumnTy,

    /// SQL expression producing the value, selected under the column name
    pub get: Option<String>,

    /// SQL template writing the value. Each `?` binds the in-memory value.
    pub set: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnTy {
    /// Stored and read back as-is
    #[default]
    Regular,

    /// Stored as serialized JSON text
    Json,

    /// Computed by server-side SQL expressions
    Sql,
}

impl Column {
    pub fn is_sql(&self) -> bool {
        self.ty == ColumnTy::Sql
    }

    pub fn is_json(&self) -> bool {
        self.ty == ColumnTy::Json
    }

    /// SQL columns are readable when they declare a `get` expression.
    pub fn is_readable(&self) -> bool {
        self.is_sql() && self.get.is_some()
    }

    /// SQL columns are writable when they declare a `set` template.
    pub fn is_writable(&self) -> bool {
        self.is_sql() && self.set.is_some()
    }
}
