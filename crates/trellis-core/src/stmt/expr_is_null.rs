use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ExprIsNull {
    pub expr: Box<Expr>,
    pub negate: bool,
}

impl ExprIsNull {
    pub fn new(expr: Expr, negate: bool) -> Self {
        Self {
            expr: Box::new(expr),
            negate,
        }
    }
}

impl From<ExprIsNull> for Expr {
    fn from(value: ExprIsNull) -> Self {
        Expr::IsNull(value)
    }
}
