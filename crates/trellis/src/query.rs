use crate::{db::Transaction, Db, Result};

use trellis_core::{
    driver::Rows,
    stmt::{self, Assignments, Expr, OrderBy, Returning, SelectItem, Value},
};

use indexmap::IndexMap;

/// A fetched row: column name to value, in select-list order.
pub type Row = IndexMap<String, Value>;

/// A query against one table.
///
/// Builder methods consume and return the query. Terminals execute it on the
/// pinned transaction when one is set, otherwise on a pooled connection.
#[derive(Debug, Clone)]
pub struct Query {
    db: Db,
    select: stmt::Select,
    transacting: Option<Transaction>,
}

impl Query {
    pub(crate) fn new(db: Db, table: impl Into<String>) -> Query {
        Query {
            db,
            select: stmt::Select::new(table),
            transacting: None,
        }
    }

    /// Wraps an already built select.
    pub fn from_select(db: Db, select: stmt::Select) -> Query {
        Query {
            db,
            select,
            transacting: None,
        }
    }

    /// `column = value`, or `column IS NULL` for a null value.
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Query {
        self.filter(Expr::column_eq(column, value))
    }

    /// ANDs an arbitrary expression onto the filter.
    pub fn and_where(self, expr: impl Into<Expr>) -> Query {
        self.filter(expr)
    }

    pub fn filter(mut self, expr: impl Into<Expr>) -> Query {
        self.select.and_filter(expr);
        self
    }

    pub fn where_in(self, column: impl Into<String>, values: Vec<Value>) -> Query {
        self.filter(Expr::in_list(Expr::column(column), values))
    }

    pub fn where_not_in(self, column: impl Into<String>, values: Vec<Value>) -> Query {
        self.filter(Expr::not_in_list(Expr::column(column), values))
    }

    pub fn where_null(self, column: impl Into<String>) -> Query {
        self.filter(Expr::is_null(Expr::column(column)))
    }

    /// ORs `column IS NULL` onto the whole current filter.
    pub fn or_where_null(mut self, column: impl Into<String>) -> Query {
        let is_null = Expr::is_null(Expr::column(column));
        self.select.filter = Some(match self.select.filter.take() {
            Some(filter) => Expr::or(filter, is_null),
            None => is_null,
        });
        self
    }

    /// Adds plain columns to the select list.
    pub fn select<I, S>(mut self, columns: I) -> Query
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            self.select.push_item(SelectItem::column(column));
        }
        self
    }

    /// Adds `sql AS alias` to the select list.
    pub fn select_raw(mut self, sql: impl Into<String>, alias: impl Into<String>) -> Query {
        self.select.push_item(SelectItem::aliased(Expr::raw(sql), alias));
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Query {
        self.select.order_by.push(order_by);
        self
    }

    /// Orders rows by the position of `column` within `values`.
    pub fn order_by_position(self, column: impl Into<String>, values: Vec<Value>) -> Query {
        self.order_by(OrderBy::position(column, values))
    }

    pub fn limit(mut self, limit: u64) -> Query {
        self.select.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Query {
        self.select.offset = Some(offset);
        self
    }

    /// Pins the query to a transaction. `None` leaves it unpinned.
    pub fn transacting(mut self, transaction: Option<&Transaction>) -> Query {
        self.transacting = transaction.cloned();
        self
    }

    pub fn statement(&self) -> &stmt::Select {
        &self.select
    }

    pub fn statement_mut(&mut self) -> &mut stmt::Select {
        &mut self.select
    }

    pub async fn all(self) -> Result<Vec<Row>> {
        let rows = self.exec(self.select.clone()).await?;
        Ok(rows.into_values()?.into_maps())
    }

    pub async fn first(mut self) -> Result<Option<Row>> {
        self.select.limit = Some(1);
        Ok(self.all().await?.into_iter().next())
    }

    pub async fn count(mut self) -> Result<u64> {
        self.select.returning = Returning::Count;
        self.select.order_by.clear();

        let rows = self.exec(self.select.clone()).await?.into_values()?;
        let count = rows
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .unwrap_or(0);

        Ok(count as u64)
    }

    /// Applies `assignments` to every matching row. Returns the number of
    /// rows changed.
    pub async fn update(self, assignments: Assignments) -> Result<u64> {
        let mut update = stmt::Update::new(&self.select.table, assignments);
        update.filter = self.select.filter.clone();

        Ok(self.exec(update).await?.len())
    }

    /// Inserts one row into the query's table.
    pub async fn insert(self, values: Assignments) -> Result<u64> {
        let insert = stmt::Insert::new(&self.select.table, values);
        Ok(self.exec(insert).await?.len())
    }

    /// Inserts one row and returns `returning` columns as stored.
    pub async fn insert_returning(
        self,
        values: Assignments,
        returning: Vec<String>,
    ) -> Result<Row> {
        let mut insert = stmt::Insert::new(&self.select.table, values);
        insert.returning = Some(returning);

        let rows = self.exec(insert).await?.into_values()?;
        Ok(rows.into_maps().into_iter().next().unwrap_or_default())
    }

    /// Deletes every matching row. Returns the number of rows removed.
    pub async fn delete(self) -> Result<u64> {
        let mut delete = stmt::Delete::new(&self.select.table);
        delete.filter = self.select.filter.clone();

        Ok(self.exec(delete).await?.len())
    }

    async fn exec(&self, stmt: impl Into<stmt::Statement>) -> Result<Rows> {
        self.db.exec(stmt, self.transacting.as_ref()).await
    }
}
