use super::{Formatter, Params, ToSql};

/// A possibly dotted identifier. Each segment is quoted separately.
pub(super) struct Ident<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let mut s = "";
        for segment in self.0.as_ref().split('.') {
            f.dst.push_str(s);
            f.dst.push('"');
            f.dst.push_str(&segment.replace('"', "\"\""));
            f.dst.push('"');
            s = ".";
        }
    }
}
