use super::Error;

/// Error when a caller omits an option the operation cannot proceed
/// without. Raised at the call boundary, before any I/O happens.
#[derive(Debug)]
pub(super) struct MissingRequiredOption {
    option: Box<str>,
}

impl std::error::Error for MissingRequiredOption {}

impl core::fmt::Display for MissingRequiredOption {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "missing required option `{}`", self.option)
    }
}

impl Error {
    pub fn missing_required_option(option: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MissingRequiredOption(
            MissingRequiredOption {
                option: option.into().into(),
            },
        ))
    }

    pub fn is_missing_required_option(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::MissingRequiredOption(_))
    }
}
