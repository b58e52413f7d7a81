use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInList {
    pub expr: Box<Expr>,
    pub list: Vec<Value>,
    pub negate: bool,
}

impl ExprInList {
    pub fn new(expr: Expr, list: Vec<Value>, negate: bool) -> Self {
        Self {
            expr: Box::new(expr),
            list,
            negate,
        }
    }
}

impl From<ExprInList> for Expr {
    fn from(value: ExprInList) -> Self {
        Expr::InList(value)
    }
}
