use super::Error;

/// Error when two mappings are registered under the same logical name.
#[derive(Debug)]
pub(super) struct DuplicateMappingRegistration {
    name: Box<str>,
}

impl std::error::Error for DuplicateMappingRegistration {}

impl core::fmt::Display for DuplicateMappingRegistration {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "mapping `{}` is already registered", self.name)
    }
}

impl Error {
    pub fn duplicate_mapping_registration(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DuplicateMappingRegistration(
            DuplicateMappingRegistration {
                name: name.into().into(),
            },
        ))
    }

    pub fn is_duplicate_mapping_registration(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DuplicateMappingRegistration(_))
    }
}
