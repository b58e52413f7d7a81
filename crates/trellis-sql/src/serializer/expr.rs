use super::{Comma, Delimited, Ident, Params, ToSql};

use trellis_core::stmt::{self, BinaryOp, Expr};

/// Operand of AND, OR and NOT. Compound operands are parenthesized.
struct Operand<'a>(&'a Expr);

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            Expr::And(operands) if operands.is_empty() => fmt!(f, "1 = 1"),
            Expr::And(operands) => {
                fmt!(f, Delimited(operands.iter().map(Operand), " AND "));
            }
            Expr::Or(operands) if operands.is_empty() => fmt!(f, "1 = 0"),
            Expr::Or(operands) => {
                fmt!(f, Delimited(operands.iter().map(Operand), " OR "));
            }
            Expr::BinaryOp(expr) => {
                let lhs: &Expr = &expr.lhs;
                let rhs: &Expr = &expr.rhs;

                // `= NULL` never matches; compare with IS instead
                match (expr.op, rhs) {
                    (BinaryOp::Eq, Expr::Value(stmt::Value::Null)) => fmt!(f, lhs " IS NULL"),
                    (BinaryOp::Ne, Expr::Value(stmt::Value::Null)) => {
                        fmt!(f, lhs " IS NOT NULL")
                    }
                    _ => fmt!(f, lhs " " expr.op " " rhs),
                }
            }
            Expr::Column(expr) => {
                fmt!(f, Ident(&expr.name));
            }
            Expr::InList(expr) => match (expr.list.is_empty(), expr.negate) {
                (true, false) => fmt!(f, "1 = 0"),
                (true, true) => fmt!(f, "1 = 1"),
                (false, negate) => {
                    let lhs: &Expr = &expr.expr;
                    let op = if negate { " NOT IN (" } else { " IN (" };
                    fmt!(f, lhs op Comma(&expr.list) ")");
                }
            },
            Expr::IsNull(expr) => {
                let operand: &Expr = &expr.expr;
                let op = if expr.negate { " IS NOT NULL" } else { " IS NULL" };
                fmt!(f, operand op);
            }
            Expr::Not(expr) => {
                let operand: &Expr = expr;
                fmt!(f, "NOT (" operand ")");
            }
            Expr::Raw(expr) => {
                fmt!(f, expr);
            }
            Expr::Value(value) => {
                fmt!(f, value);
            }
        }
    }
}

impl ToSql for Operand<'_> {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self.0 {
            Expr::And(_) | Expr::Or(_) | Expr::Raw(_) => fmt!(f, "(" self.0 ")"),
            expr => fmt!(f, expr),
        }
    }
}

impl ToSql for &stmt::ExprRaw {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let mut params = self.params.iter();
        let mut segments = self.sql.split('?');

        if let Some(first) = segments.next() {
            fmt!(f, first);
        }

        // A marker without a matching parameter binds NULL
        for segment in segments {
            let value = params.next().unwrap_or(&stmt::Value::Null);
            fmt!(f, value segment);
        }
    }
}

impl ToSql for BinaryOp {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        f.dst.push_str(match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
        })
    }
}
