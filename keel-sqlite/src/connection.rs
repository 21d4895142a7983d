use crate::{
    driver::Anchor,
    extract::{ValueWrap, extract_value},
};
use async_stream::try_stream;
use keel_core::{
    Connection, Context, Error, Query, Result, Row, RowLabeled, RowNames, RowsAffected,
    stream::Stream,
};
use rusqlite::{InterruptHandle, OpenFlags, params_from_iter};
use std::{future::Future, sync::PoisonError, time::Duration};
use tokio::task::spawn_blocking;

pub struct SqliteConnection {
    // Moved onto a blocking thread for the duration of every statement
    pub(crate) connection: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Opens `path`, first opening the `anchor` connection if one is given and still empty.
    pub(crate) async fn open(path: String, anchor: Option<Anchor>) -> Result<Self> {
        let context = format!("While opening the SQLite database `{}`", path);
        let result = spawn_blocking(move || -> Result<rusqlite::Connection> {
            if let Some(anchor) = anchor {
                let mut anchor = anchor.lock().unwrap_or_else(PoisonError::into_inner);
                if anchor.is_none() {
                    *anchor = Some(open_database(&path)?);
                    log::debug!("Opened the anchor connection of `{}`", path);
                }
            }
            Ok(open_database(&path)?)
        })
        .await
        .map_err(Error::new)
        .and_then(|v| v)
        .context(context);
        match result {
            Ok(connection) => Ok(Self {
                connection: Some(connection),
            }),
            Err(error) => {
                log::error!("{:#}", error);
                Err(error)
            }
        }
    }

    /// Runs `f` on a blocking thread. If the returned future is dropped before completion
    /// the statement is interrupted and the connection is lost.
    async fn run<T, F>(&mut self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let Some(connection) = self.connection.take() else {
            return Err(Error::msg("The SQLite connection is no longer available"));
        };
        let mut interrupt = InterruptOnDrop(Some(connection.get_interrupt_handle()));
        let (connection, result) = spawn_blocking(move || {
            let result = f(&connection);
            (connection, result)
        })
        .await?;
        interrupt.0 = None;
        self.connection = Some(connection);
        result
    }
}

fn open_database(path: &str) -> rusqlite::Result<rusqlite::Connection> {
    let connection = rusqlite::Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    connection.busy_timeout(Duration::from_secs(5))?;
    Ok(connection)
}

struct InterruptOnDrop(Option<InterruptHandle>);

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.interrupt();
        }
    }
}

fn read_rows(
    connection: &rusqlite::Connection,
    query: &Query,
    limit: Option<u64>,
) -> Result<Vec<RowLabeled>> {
    let mut statement = connection.prepare(&query.sql)?;
    let labels: RowNames = statement
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = statement.query(params_from_iter(query.params.iter().map(ValueWrap)))?;
    let mut result = Vec::new();
    while limit.is_none_or(|limit| (result.len() as u64) < limit) {
        let Some(row) = rows.next()? else {
            break;
        };
        let values = (0..labels.len())
            .map(|i| row.get_ref(i).map(extract_value))
            .collect::<rusqlite::Result<Row>>()?;
        result.push(RowLabeled::new(labels.clone(), values));
    }
    Ok(result)
}

impl Connection for SqliteConnection {
    fn fetch(
        &mut self,
        query: Query,
        limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        try_stream! {
            let rows = self.run(move |c| read_rows(c, &query, limit)).await?;
            for row in rows {
                yield row;
            }
        }
    }

    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(move |c| {
            let mut statement = c.prepare(&query.sql)?;
            let rows = statement.execute(params_from_iter(query.params.iter().map(ValueWrap)))?;
            Ok(RowsAffected {
                rows_affected: rows as u64,
                last_affected_id: Some(c.last_insert_rowid()),
            })
        })
    }

    fn is_broken(&self) -> bool {
        self.connection.is_none()
    }

    fn disconnect(mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            let Some(connection) = self.connection.take() else {
                return Ok(());
            };
            spawn_blocking(move || connection.close().map_err(|(_, e)| e))
                .await?
                .context("While closing the SQLite connection")
        }
    }
}
