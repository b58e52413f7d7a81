use super::Error;

/// Error when a mapping descriptor is internally inconsistent.
///
/// Raised while compiling the registry:
/// - two columns or two relations share a name
/// - the identifying column is declared as an SQL column
/// - a history mapping lacks its revision or parent column
#[derive(Debug)]
pub(super) struct InvalidMapping {
    mapping: Box<str>,
    message: Box<str>,
}

impl std::error::Error for InvalidMapping {}

impl core::fmt::Display for InvalidMapping {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping `{}`: {}", self.mapping, self.message)
    }
}

impl Error {
    pub fn invalid_mapping(mapping: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidMapping(InvalidMapping {
            mapping: mapping.into().into(),
            message: message.into().into(),
        }))
    }

    pub fn is_invalid_mapping(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidMapping(_))
    }
}
