use crate::Error;

/// Error when a connection URL cannot be parsed or names no built-in driver.
#[derive(Debug)]
pub(super) struct InvalidConnectionUrl {
    url: Box<str>,
    reason: Box<str>,
}

impl Error {
    pub fn invalid_connection_url(url: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidConnectionUrl(
            InvalidConnectionUrl {
                url: url.into().into(),
                reason: reason.into().into(),
            },
        ))
    }

    pub fn is_invalid_connection_url(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidConnectionUrl(_))
    }
}

impl std::fmt::Display for InvalidConnectionUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid connection URL `{}`: {}", self.url, self.reason)
    }
}
