use super::*;

/// A SQL expression: filters, select items, assignment values.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// AND a set of expressions
    And(Vec<Expr>),

    /// Binary comparison
    BinaryOp(ExprBinaryOp),

    /// Reference to a column, optionally table qualified
    Column(ExprColumn),

    /// `expr [NOT] IN (values)`
    InList(ExprInList),

    /// `expr IS [NOT] NULL`
    IsNull(ExprIsNull),

    /// Negation
    Not(Box<Expr>),

    /// OR a set of expressions
    Or(Vec<Expr>),

    /// Raw SQL with `?` bind markers
    Raw(ExprRaw),

    /// A bound value
    Value(Value),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Expr {
        ExprColumn::new(name).into()
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn null() -> Expr {
        Expr::Value(Value::Null)
    }

    /// Raw SQL without parameters.
    pub fn raw(sql: impl Into<String>) -> Expr {
        ExprRaw::new(sql, vec![]).into()
    }

    /// Raw SQL whose `?` markers bind `params` in order.
    pub fn raw_with(sql: impl Into<String>, params: Vec<Value>) -> Expr {
        ExprRaw::new(sql, params).into()
    }

    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        ExprBinaryOp::new(lhs.into(), BinaryOp::Eq, rhs.into()).into()
    }

    pub fn ne(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        ExprBinaryOp::new(lhs.into(), BinaryOp::Ne, rhs.into()).into()
    }

    /// `column = value`, or `column IS NULL` when the value is null.
    pub fn column_eq(column: impl Into<String>, value: impl Into<Value>) -> Expr {
        let value = value.into();
        if value.is_null() {
            Expr::is_null(Expr::column(column))
        } else {
            Expr::eq(Expr::column(column), value)
        }
    }

    pub fn is_null(expr: impl Into<Expr>) -> Expr {
        ExprIsNull::new(expr.into(), false).into()
    }

    pub fn is_not_null(expr: impl Into<Expr>) -> Expr {
        ExprIsNull::new(expr.into(), true).into()
    }

    pub fn in_list(expr: impl Into<Expr>, list: Vec<Value>) -> Expr {
        ExprInList::new(expr.into(), list, false).into()
    }

    pub fn not_in_list(expr: impl Into<Expr>, list: Vec<Value>) -> Expr {
        ExprInList::new(expr.into(), list, true).into()
    }

    pub fn not(expr: impl Into<Expr>) -> Expr {
        Expr::Not(Box::new(expr.into()))
    }

    /// Conjunction that flattens nested `And` operands.
    pub fn and(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        let mut operands = vec![];
        for expr in [lhs.into(), rhs.into()] {
            match expr {
                Expr::And(nested) => operands.extend(nested),
                expr => operands.push(expr),
            }
        }
        Expr::And(operands)
    }

    /// Disjunction that flattens nested `Or` operands.
    pub fn or(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        let mut operands = vec![];
        for expr in [lhs.into(), rhs.into()] {
            match expr {
                Expr::Or(nested) => operands.extend(nested),
                expr => operands.push(expr),
            }
        }
        Expr::Or(operands)
    }

    /// ANDs `other` onto an optional filter.
    pub fn and_option(filter: Option<Expr>, other: impl Into<Expr>) -> Expr {
        match filter {
            Some(filter) => Expr::and(filter, other),
            None => other.into(),
        }
    }

    pub fn is_value_null(&self) -> bool {
        matches!(self, Expr::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Expr::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<&Value> for Expr {
    fn from(value: &Value) -> Self {
        Expr::Value(value.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Expr {
    fn from(value: Option<T>) -> Self {
        Expr::Value(value.into())
    }
}

macro_rules! impl_expr_from_value {
    ( $($t:ty),+ ) => {
        $(
            impl From<$t> for Expr {
                fn from(value: $t) -> Self {
                    Expr::Value(value.into())
                }
            }
        )+
    };
}

impl_expr_from_value!(bool, i32, i64, u32, f64, &str, String, serde_json::Value);
