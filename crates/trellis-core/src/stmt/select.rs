use super::{Expr, OrderBy};

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Table to select from, possibly schema-qualified
    pub table: String,

    /// What the query returns
    pub returning: Returning,

    /// WHERE clause
    pub filter: Option<Expr>,

    pub order_by: Vec<OrderBy>,

    pub limit: Option<u64>,

    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Returning {
    /// `SELECT *`
    All,

    /// Explicit select list
    Items(Vec<SelectItem>),

    /// `SELECT COUNT(*)`
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl Select {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            returning: Returning::All,
            filter: None,
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }

    /// ANDs `expr` onto the current filter.
    pub fn and_filter(&mut self, expr: impl Into<Expr>) {
        self.filter = Some(Expr::and_option(self.filter.take(), expr));
    }

    /// Appends an item to the select list, replacing `*`.
    pub fn push_item(&mut self, item: SelectItem) {
        match &mut self.returning {
            Returning::Items(items) => items.push(item),
            returning => *returning = Returning::Items(vec![item]),
        }
    }

    /// Names the result columns will carry, when they are known up front.
    pub fn item_names(&self) -> Option<Vec<&str>> {
        match &self.returning {
            Returning::Items(items) => items.iter().map(SelectItem::name).collect(),
            _ => None,
        }
    }
}

impl SelectItem {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            expr: Expr::column(name),
            alias: None,
        }
    }

    /// `expr AS alias`
    pub fn aliased(expr: impl Into<Expr>, alias: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            alias: Some(alias.into()),
        }
    }

    /// The result column name of this item, if it can be determined.
    pub fn name(&self) -> Option<&str> {
        match (&self.alias, &self.expr) {
            (Some(alias), _) => Some(alias),
            (None, Expr::Column(column)) => Some(column.unqualified()),
            _ => None,
        }
    }
}
