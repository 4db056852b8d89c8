// Coffer: transaction capability
//
// The vault store reaches the storage engine only through these two traits.
// A provider hands out transactions; a transaction can run parameterized
// statements, scan one row or many, and finish with commit or rollback.
// Dropping an unfinished transaction must roll it back.

use super::error::DbError;

// ─── Values ──────────────────────────────────────────────────────────────────

/// A positional statement parameter or a scanned column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// One scanned result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read column `index` as an integer.
    pub fn integer(&self, index: usize) -> Result<i64, DbError> {
        match self.0.get(index) {
            Some(Value::Integer(v)) => Ok(*v),
            Some(_) => Err(DbError::ColumnType {
                index,
                expected: "an integer",
            }),
            None => Err(DbError::ColumnIndex(index)),
        }
    }

    /// Read column `index` as text.
    pub fn text(&self, index: usize) -> Result<&str, DbError> {
        match self.0.get(index) {
            Some(Value::Text(v)) => Ok(v),
            Some(_) => Err(DbError::ColumnType {
                index,
                expected: "text",
            }),
            None => Err(DbError::ColumnIndex(index)),
        }
    }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Source of transactions. Each call to `begin` yields an independent
/// transaction; no two operations ever share one.
pub trait TransactionProvider: Send + Sync {
    type Tx<'a>: Transaction
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Tx<'_>, DbError>;
}

/// A single open transaction.
pub trait Transaction {
    /// Run a statement that returns no rows. Returns the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize, DbError>;

    /// Run a query and scan its first row, if any.
    fn query_row(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>, DbError>;

    /// Run a query and scan every row.
    fn query_rows(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError>;

    fn commit(self) -> Result<(), DbError>;

    fn rollback(self) -> Result<(), DbError>;
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_typed_access() {
        let row = Row::new(vec![Value::Integer(7), Value::from("db")]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.integer(0).unwrap(), 7);
        assert_eq!(row.text(1).unwrap(), "db");
    }

    #[test]
    fn test_row_type_mismatch_is_an_error() {
        let row = Row::new(vec![Value::Null, Value::from("db")]);
        assert!(matches!(
            row.integer(0),
            Err(DbError::ColumnType { index: 0, .. })
        ));
        assert!(matches!(
            row.integer(1),
            Err(DbError::ColumnType { index: 1, .. })
        ));
        assert!(matches!(row.text(5), Err(DbError::ColumnIndex(5))));
    }
}
