use crate::logging_driver::DriverOp;
use std::sync::{Arc, Mutex};
use trellis_core::{
    driver::{operation::Transaction, Operation, Response},
    stmt::{Statement, Value},
};
use trellis_sql::Serializer;

/// A wrapper around the operations log that provides a clean API for tests
pub struct ExecLog {
    ops: Arc<Mutex<Vec<DriverOp>>>,
}

impl ExecLog {
    pub(crate) fn new(ops: Arc<Mutex<Vec<DriverOp>>>) -> Self {
        Self { ops }
    }

    /// Get the number of logged operations
    pub fn len(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }

    /// Count operations matching the given predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Operation) -> bool,
    {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| predicate(&op.operation))
            .count()
    }

    /// Every logged SQL statement, in execution order
    pub fn statements(&self) -> Vec<Statement> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| op.operation.as_query_sql())
            .map(|op| op.stmt.clone())
            .collect()
    }

    /// Count statements matching the given predicate
    pub fn count_statements<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Statement) -> bool,
    {
        self.statements().iter().filter(|stmt| predicate(stmt)).count()
    }

    /// Number of selects issued against `table`
    pub fn selects_on(&self, table: &str) -> usize {
        self.count_statements(|stmt| stmt.is_select() && stmt.table() == table)
    }

    pub fn inserts_into(&self, table: &str) -> usize {
        self.count_statements(|stmt| stmt.is_insert() && stmt.table() == table)
    }

    pub fn updates_of(&self, table: &str) -> usize {
        self.count_statements(|stmt| stmt.is_update() && stmt.table() == table)
    }

    pub fn deletes_from(&self, table: &str) -> usize {
        self.count_statements(|stmt| stmt.is_delete() && stmt.table() == table)
    }

    /// Logged transaction lifecycle operations
    pub fn transactions(&self) -> Vec<Transaction> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op.operation {
                Operation::Transaction(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    /// Logged statements rendered as SQLite SQL
    pub fn sql(&self) -> Vec<String> {
        self.statements()
            .iter()
            .map(|stmt| {
                let mut params: Vec<Value> = vec![];
                Serializer::sqlite().serialize(stmt, &mut params)
            })
            .collect()
    }

    /// Clear the log
    pub fn clear(&mut self) {
        self.ops.lock().unwrap().clear();
    }

    /// Remove and return the first operation from the log
    /// Returns None if the log is empty
    pub fn pop(&mut self) -> Option<(Operation, Response)> {
        let mut ops = self.ops.lock().unwrap();
        if ops.is_empty() {
            None
        } else {
            let driver_op = ops.remove(0);
            Some((driver_op.operation, driver_op.response))
        }
    }
}
