use super::Error;

/// Error when a relation descriptor names a type other than `hasOne`,
/// `hasMany` or `belongsTo`.
#[derive(Debug)]
pub(super) struct UnsupportedRelationShape {
    ty: Box<str>,
}

impl std::error::Error for UnsupportedRelationShape {}

impl core::fmt::Display for UnsupportedRelationShape {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unsupported relation type `{}`; expected one of hasOne, hasMany, belongsTo",
            self.ty
        )
    }
}

impl Error {
    pub fn unsupported_relation_shape(ty: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnsupportedRelationShape(
            UnsupportedRelationShape {
                ty: ty.into().into(),
            },
        ))
    }

    pub fn is_unsupported_relation_shape(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnsupportedRelationShape(_))
    }
}
