use crate::{
    Connection, Driver, Error, Pool, PooledConnection, Query, QueryError, Result, RowCountPolicy,
    RowLabeled, RowsAffected, SqlWriter, Value, stream::TryStreamExt, truncate_long,
};
use std::future::Future;

/// Runs SQL written with `?` placeholders, always binding the arguments.
pub trait Executor: Send + Sync {
    /// Execute a statement returning rows, at most `limit` of them.
    fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<u64>,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send;

    /// Execute a statement and return the number of rows it touched.
    fn execute(&self, sql: &str, args: &[Value])
    -> impl Future<Output = Result<RowsAffected>> + Send;

    /// What entity writes do when they touch other than exactly one row.
    fn row_count_policy(&self) -> RowCountPolicy {
        RowCountPolicy::Warn
    }
}

impl<D: Driver> Pool<D> {
    /// Translate `sql` to the native placeholders of the driver and check the arguments.
    fn prepare(&self, sql: &str, args: &[Value]) -> Result<Query> {
        let (native, expected) = self.driver().sql_writer().rewrite_placeholders(sql);
        if expected != args.len() {
            let error = Error::new(QueryError::new(
                sql,
                args,
                format!(
                    "The query expects {} arguments but {} were provided",
                    expected,
                    args.len()
                ),
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(Query::new(native, args.to_vec()))
    }

    async fn statement_failed(
        &self,
        mut connection: PooledConnection<'_, D>,
        sql: &str,
        args: &[Value],
        error: Error,
    ) -> Error {
        let evict = self.driver().is_connection_error(&error) || connection.is_broken();
        if evict {
            log::warn!("Evicting a broken `{}` connection", D::NAME);
            connection.evict();
        }
        drop(connection);
        if evict {
            self.replenish().await;
        }
        let error = Error::new(QueryError::new(sql, args, error));
        log::error!("{:#}", error);
        error
    }
}

impl<D: Driver> Executor for Pool<D> {
    fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<u64>,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        async move {
            log::info!("SQL: {} (Args: {:?})", truncate_long!(sql), args);
            let query = self.prepare(sql, args)?;
            let mut connection = self.acquire().await?;
            let result: Result<Vec<RowLabeled>> =
                connection.fetch(query, limit).try_collect().await;
            match result {
                Ok(rows) => {
                    log::info!("rows returned: {}", rows.len());
                    Ok(rows)
                }
                Err(error) => Err(self.statement_failed(connection, sql, args, error).await),
            }
        }
    }

    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            log::info!("SQL: {} (Args: {:?})", truncate_long!(sql), args);
            let query = self.prepare(sql, args)?;
            let mut connection = self.acquire().await?;
            let result = connection.execute(query).await;
            match result {
                Ok(affected) => {
                    log::debug!("rows affected: {}", affected.rows_affected);
                    Ok(affected)
                }
                Err(error) => Err(self.statement_failed(connection, sql, args, error).await),
            }
        }
    }

    fn row_count_policy(&self) -> RowCountPolicy {
        self.config().row_count_policy
    }
}
