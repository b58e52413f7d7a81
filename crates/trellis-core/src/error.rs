mod adhoc;
mod connection_pool;
mod driver_operation_failed;
mod duplicate_mapping_registration;
mod invalid_connection_url;
mod invalid_mapping;
mod missing_required_option;
mod record_not_found;
mod serialization;
mod transaction_finished;
mod unregistered_mapping;
mod unremovable_related_value;
mod unsaveable_related_value;
mod unsupported_relation_shape;

use adhoc::AdhocError;
use connection_pool::ConnectionPoolError;
use driver_operation_failed::DriverOperationFailed;
use duplicate_mapping_registration::DuplicateMappingRegistration;
use invalid_connection_url::InvalidConnectionUrl;
use invalid_mapping::InvalidMapping;
use missing_required_option::MissingRequiredOption;
use record_not_found::RecordNotFoundError;
use serialization::SerializationError;
use std::sync::Arc;
use transaction_finished::TransactionFinished;
use unregistered_mapping::UnregisteredMapping;
use unremovable_related_value::UnremovableRelatedValue;
use unsaveable_related_value::UnsaveableRelatedValue;
use unsupported_relation_shape::UnsupportedRelationShape;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Trellis.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => inner.kind,
                Err(shared) => ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    /// The innermost error of the context chain.
    pub fn root(&self) -> &Error {
        self.chain().last().unwrap_or(self)
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::DriverOperationFailed(err) => Some(err),
            ErrorKind::ConnectionPool(err) => Some(err),
            ErrorKind::Serialization(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    DriverOperationFailed(DriverOperationFailed),
    ConnectionPool(ConnectionPoolError),
    InvalidConnectionUrl(InvalidConnectionUrl),
    RecordNotFound(RecordNotFoundError),
    UnsupportedRelationShape(UnsupportedRelationShape),
    UnsaveableRelatedValue(UnsaveableRelatedValue),
    UnremovableRelatedValue(UnremovableRelatedValue),
    MissingRequiredOption(MissingRequiredOption),
    DuplicateMappingRegistration(DuplicateMappingRegistration),
    UnregisteredMapping(UnregisteredMapping),
    InvalidMapping(InvalidMapping),
    Serialization(SerializationError),
    TransactionFinished(TransactionFinished),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            DriverOperationFailed(err) => core::fmt::Display::fmt(err, f),
            ConnectionPool(err) => core::fmt::Display::fmt(err, f),
            InvalidConnectionUrl(err) => core::fmt::Display::fmt(err, f),
            RecordNotFound(err) => core::fmt::Display::fmt(err, f),
            UnsupportedRelationShape(err) => core::fmt::Display::fmt(err, f),
            UnsaveableRelatedValue(err) => core::fmt::Display::fmt(err, f),
            UnremovableRelatedValue(err) => core::fmt::Display::fmt(err, f),
            MissingRequiredOption(err) => core::fmt::Display::fmt(err, f),
            DuplicateMappingRegistration(err) => core::fmt::Display::fmt(err, f),
            UnregisteredMapping(err) => core::fmt::Display::fmt(err, f),
            InvalidMapping(err) => core::fmt::Display::fmt(err, f),
            Serialization(err) => core::fmt::Display::fmt(err, f),
            TransactionFinished(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown trellis error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::serialization(err)
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}
