use super::Error;

/// Error when compiling or looking up a mapping name that was never
/// registered.
#[derive(Debug)]
pub(super) struct UnregisteredMapping {
    name: Box<str>,
}

impl std::error::Error for UnregisteredMapping {}

impl core::fmt::Display for UnregisteredMapping {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "mapping `{}` is not registered", self.name)
    }
}

impl Error {
    pub fn unregistered_mapping(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnregisteredMapping(UnregisteredMapping {
            name: name.into().into(),
        }))
    }

    pub fn is_unregistered_mapping(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnregisteredMapping(_))
    }
}
