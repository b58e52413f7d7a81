/// Builds a [`stmt::Assignments`](crate::stmt::Assignments) patch from
/// `column => value` pairs.
#[macro_export]
macro_rules! patch {
    ( $( $column:expr => $value:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut patch = $crate::stmt::Assignments::default();
        $( patch.set($column, $value); )*
        patch
    }};
}
