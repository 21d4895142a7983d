use crate::{RowWrap, ValueWrap};
use async_stream::try_stream;
use keel_core::{
    Connection, Query, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt},
};
use mysql_async::{Conn, Params, prelude::Queryable};
use std::future::Future;

pub struct MySQLConnection {
    pub(crate) connection: Conn,
}

fn params(values: Vec<keel_core::Value>) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.into_iter().map(|v| ValueWrap(v).into()).collect())
    }
}

impl Connection for MySQLConnection {
    fn fetch(
        &mut self,
        query: Query,
        limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        try_stream! {
            let Query { sql, params: values } = query;
            let mut stream = self
                .connection
                .exec_stream::<RowWrap, _, _>(sql, params(values))
                .await?;
            let mut returned = 0;
            while limit.is_none_or(|limit| returned < limit) {
                let Some(row) = stream.next().await.transpose()? else {
                    break;
                };
                returned += 1;
                yield row.0;
            }
        }
    }

    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            let Query { sql, params: values } = query;
            self.connection.exec_drop(sql, params(values)).await?;
            Ok(RowsAffected {
                rows_affected: self.connection.affected_rows(),
                last_affected_id: self.connection.last_insert_id().map(|v| v as _),
            })
        }
    }

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.connection.disconnect().await?;
            Ok(())
        }
    }
}
