use super::{Comma, Ident, Params, ToSql};

use trellis_core::stmt::{self, Direction, OrderBy, Returning, SelectItem, Statement};

impl ToSql for &Statement {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            Statement::Delete(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::Select(stmt) => stmt.to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let returning = &self.returning;
        fmt!(f, "SELECT " returning " FROM " Ident(&self.table));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        let order_by: Vec<_> = self
            .order_by
            .iter()
            .filter(|order_by| {
                !matches!(order_by, OrderBy::Position { values, .. } if values.is_empty())
            })
            .collect();

        if !order_by.is_empty() {
            fmt!(f, " ORDER BY " Comma(order_by));
        }

        match (self.limit, self.offset) {
            (Some(limit), _) => fmt!(f, " LIMIT " limit),
            // SQLite only accepts OFFSET after a LIMIT
            (None, Some(_)) if f.serializer.is_sqlite() => fmt!(f, " LIMIT -1"),
            (None, _) => {}
        }

        if let Some(offset) = self.offset {
            fmt!(f, " OFFSET " offset);
        }
    }
}

impl ToSql for &Returning {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            Returning::Items(items) if !items.is_empty() => fmt!(f, Comma(items)),
            Returning::All | Returning::Items(_) => fmt!(f, "*"),
            Returning::Count => fmt!(f, "COUNT(*)"),
        }
    }
}

impl ToSql for &SelectItem {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, &self.expr);

        if let Some(alias) = &self.alias {
            fmt!(f, " AS " Ident(alias));
        }
    }
}

impl ToSql for &OrderBy {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            OrderBy::Column { name, direction } => {
                let direction = match direction {
                    Direction::Asc => "",
                    Direction::Desc => " DESC",
                };
                fmt!(f, Ident(name) direction);
            }
            OrderBy::Position { column, values } => {
                fmt!(f, "CASE " Ident(column));
                for (position, value) in values.iter().enumerate() {
                    fmt!(f, " WHEN " value " THEN " position);
                }
                fmt!(f, " ELSE " values.len() " END");
            }
        }
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "INSERT INTO " Ident(&self.table));

        if self.values.is_empty() {
            fmt!(f, " DEFAULT VALUES");
        } else {
            let columns = Comma(self.values.columns().map(Ident));
            let values = Comma(self.values.iter().map(|(_, expr)| expr));
            fmt!(f, " (" columns ") VALUES (" values ")");
        }

        fmt!(f, self.returning.as_ref().map(ReturningColumns));
    }
}

impl ToSql for &stmt::Update {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let assignments = Comma(
            self.assignments
                .iter()
                .map(|(column, expr)| Assignment(column, expr)),
        );
        fmt!(f, "UPDATE " Ident(&self.table) " SET " assignments);

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        fmt!(f, self.returning.as_ref().map(ReturningColumns));
    }
}

impl ToSql for &stmt::Delete {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, "DELETE FROM " Ident(&self.table));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }
    }
}

struct Assignment<'a>(&'a String, &'a stmt::Expr);

impl ToSql for Assignment<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " self.1);
    }
}

struct ReturningColumns<'a>(&'a Vec<String>);

impl ToSql for ReturningColumns<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        fmt!(f, " RETURNING " Comma(self.0.iter().map(Ident)));
    }
}
