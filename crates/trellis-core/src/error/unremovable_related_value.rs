use super::Error;

/// Error when a cascaded remove reaches a relation slot holding something
/// other than a record or a collection of records.
#[derive(Debug)]
pub(super) struct UnremovableRelatedValue {
    relation: Box<str>,
    found: Box<str>,
}

impl std::error::Error for UnremovableRelatedValue {}

impl core::fmt::Display for UnremovableRelatedValue {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "related value of `{}` cannot be removed; found {}",
            self.relation, self.found
        )
    }
}

impl Error {
    pub fn unremovable_related_value(
        relation: impl Into<String>,
        found: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::UnremovableRelatedValue(
            UnremovableRelatedValue {
                relation: relation.into().into(),
                found: found.into().into(),
            },
        ))
    }

    pub fn is_unremovable_related_value(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnremovableRelatedValue(_))
    }
}
