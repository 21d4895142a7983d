use crate::{Connection, Error, PoolConfig, Result, SqlWriter};
use std::future::Future;

/// A database backend: opens connections and knows how its SQL is written.
pub trait Driver: Send + Sync + 'static {
    type Connection: Connection;
    type SqlWriter: SqlWriter;

    /// Scheme of the connection urls accepted by this driver.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// Open a new connection, the pool decides when.
    fn connect(&self, config: &PoolConfig)
    -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Whether the error leaves the connection unusable.
    fn is_connection_error(&self, _error: &Error) -> bool {
        false
    }
}
