use crate::Value;
use std::{error::Error as StdError, time::Duration};
use thiserror::Error as ThisError;

/// Invalid entity definition, detected when the schema is built.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Entity `{entity}` declares more than one primary key (`{first}` and `{second}`)")]
    DuplicatePrimaryKey {
        entity: String,
        first: String,
        second: String,
    },
    #[error("Entity `{entity}` does not declare a primary key")]
    MissingPrimaryKey { entity: String },
    #[error("Entity `{entity}` declares the field `{field}` twice")]
    DuplicateField { entity: String, field: String },
    #[error("Entity `{entity}` has no attribute `{attribute}`")]
    UnknownAttribute { entity: String, attribute: String },
}

/// A statement that could not be executed, with the SQL and the arguments bound to it.
#[derive(Debug, ThisError)]
#[error("While running the query `{sql}` (args: {args:?})")]
pub struct QueryError {
    pub sql: String,
    pub args: Vec<Value>,
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl QueryError {
    pub fn new(
        sql: impl Into<String>,
        args: &[Value],
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            sql: sql.into(),
            args: args.to_vec(),
            source: source.into(),
        }
    }
}

#[derive(Debug, ThisError)]
pub enum PoolError {
    #[error("Pool size must satisfy 0 < min_size ({min}) <= max_size ({max})")]
    InvalidSize { min: usize, max: usize },
    #[error("The pool is closed and does not accept new acquisitions")]
    Closed,
    #[error("The pool is not ready (state: {0:?})")]
    NotReady(crate::PoolState),
    #[error("Could not acquire a connection within {0:?}")]
    Timeout(Duration),
    #[error("The connection url scheme `{found}` does not match the driver `{expected}`")]
    WrongScheme {
        expected: &'static str,
        found: String,
    },
}

/// A write statement touched a number of rows different from the single expected one.
#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("failed to {operation} record in `{table}`: affected rows {affected}")]
pub struct RowCountError {
    pub operation: &'static str,
    pub table: String,
    pub affected: u64,
}
