use super::Error;

/// Error when a JSON column cannot be marshalled to or from its stored
/// text form.
#[derive(Debug)]
pub(super) struct SerializationError {
    inner: serde_json::Error,
}

impl std::error::Error for SerializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner)
    }
}

impl core::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid JSON column value: {}", self.inner)
    }
}

impl Error {
    pub fn serialization(err: serde_json::Error) -> Error {
        Error::from(super::ErrorKind::Serialization(SerializationError {
            inner: err,
        }))
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Serialization(_))
    }
}
