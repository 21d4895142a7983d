use crate::{Query, Result, RowLabeled, RowsAffected, stream::Stream};
use std::future::Future;

/// A single session with the database. Queries reaching it are already written in the
/// native placeholder syntax of the driver.
pub trait Connection: Send + Sized + 'static {
    /// Execute the query and return at most `limit` rows.
    fn fetch(
        &mut self,
        query: Query,
        limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send;

    /// Execute the query and return the number of rows it touched.
    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send;

    /// Connections reporting true are discarded instead of going back to the pool.
    fn is_broken(&self) -> bool {
        false
    }

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send;
}
