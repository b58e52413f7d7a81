use super::Error;

/// Error when a save reaches a relation slot holding something other than
/// a record or a collection of records.
#[derive(Debug)]
pub(super) struct UnsaveableRelatedValue {
    relation: Box<str>,
    found: Box<str>,
}

impl std::error::Error for UnsaveableRelatedValue {}

impl core::fmt::Display for UnsaveableRelatedValue {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "related value of `{}` cannot be saved; found {}",
            self.relation, self.found
        )
    }
}

impl Error {
    pub fn unsaveable_related_value(
        relation: impl Into<String>,
        found: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::UnsaveableRelatedValue(
            UnsaveableRelatedValue {
                relation: relation.into().into(),
                found: found.into().into(),
            },
        ))
    }

    pub fn is_unsaveable_related_value(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnsaveableRelatedValue(_))
    }
}
