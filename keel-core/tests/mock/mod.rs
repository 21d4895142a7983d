#![allow(dead_code)]

use keel_core::{
    Connection, Driver, Error, GenericSqlWriter, PoolConfig, Query, Result, RowLabeled,
    RowsAffected, SqlWriter,
    stream::{self, Stream},
};
use std::{
    fmt::Write,
    future::{self, Future},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

/// Writer for dialects with numbered `$n` parameters and double quoted identifiers.
#[derive(Default, Debug, Clone, Copy)]
pub struct DollarSqlWriter;

impl SqlWriter for DollarSqlWriter {
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', "\"\"");
        out.push('"');
    }

    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "${}", index);
    }
}

/// Same as [`DollarSqlWriter`] with backslash escapes in quoted text.
#[derive(Default, Debug, Clone, Copy)]
pub struct BackslashSqlWriter;

impl SqlWriter for BackslashSqlWriter {
    fn backslash_escapes(&self) -> bool {
        true
    }

    fn write_placeholder(&self, out: &mut String, index: usize) {
        DollarSqlWriter.write_placeholder(out, index);
    }
}

/// Shared by a driver and all of its connections.
#[derive(Default)]
pub struct MockState {
    /// Every statement that reached a connection.
    pub executed: Mutex<Vec<Query>>,
    /// Returned by every fetch.
    pub rows: Mutex<Vec<RowLabeled>>,
    pub affected: AtomicU64,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub refuse: AtomicBool,
    /// Every statement fails with a constraint violation while set.
    pub reject: AtomicBool,
}

impl MockState {
    pub fn executed(&self) -> Vec<Query> {
        self.executed.lock().unwrap().clone()
    }
    pub fn last(&self) -> Query {
        self.executed.lock().unwrap().last().cloned().unwrap()
    }
    pub fn set_rows(&self, rows: Vec<RowLabeled>) {
        *self.rows.lock().unwrap() = rows;
    }
}

/// In memory driver. Statements containing `syntax error` fail, statements containing
/// `lost` fail with an error that breaks the connection, `sleep` never completes.
#[derive(Clone)]
pub struct MockDriver<W = GenericSqlWriter> {
    pub state: Arc<MockState>,
    writer: W,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::with_writer(GenericSqlWriter)
    }
}

impl<W> MockDriver<W> {
    pub fn with_writer(writer: W) -> Self {
        let state = MockState::default();
        state.affected.store(1, Ordering::Relaxed);
        Self {
            state: Arc::new(state),
            writer,
        }
    }
}

impl<W: SqlWriter + Clone + 'static> Driver for MockDriver<W> {
    type Connection = MockConnection;
    type SqlWriter = W;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> W {
        self.writer.clone()
    }

    fn connect(&self, _config: &PoolConfig) -> impl Future<Output = Result<MockConnection>> + Send {
        let state = self.state.clone();
        async move {
            if state.refuse.load(Ordering::Relaxed) {
                return Err(Error::msg("Connection refused"));
            }
            state.connects.fetch_add(1, Ordering::Relaxed);
            Ok(MockConnection { state })
        }
    }

    fn is_connection_error(&self, error: &Error) -> bool {
        error.to_string().contains("Lost connection")
    }
}

pub struct MockConnection {
    state: Arc<MockState>,
}

impl MockConnection {
    fn run(&mut self, query: &Query) -> Result<()> {
        self.state.executed.lock().unwrap().push(query.clone());
        if self.state.reject.load(Ordering::Relaxed) {
            return Err(Error::msg("UNIQUE constraint failed"));
        }
        if query.sql.contains("syntax error") {
            return Err(Error::msg("near \"syntax\": syntax error"));
        }
        if query.sql.contains("lost") {
            return Err(Error::msg("Lost connection to server during query"));
        }
        Ok(())
    }
}

impl Connection for MockConnection {
    fn fetch(
        &mut self,
        query: Query,
        limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let rows: Vec<Result<RowLabeled>> = match self.run(&query) {
            Ok(()) => self
                .state
                .rows
                .lock()
                .unwrap()
                .iter()
                .take(limit.map(|v| v as usize).unwrap_or(usize::MAX))
                .cloned()
                .map(Ok)
                .collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(rows)
    }

    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        let sleep = query.sql.contains("sleep");
        let result = self.run(&query).map(|_| RowsAffected {
            rows_affected: self.state.affected.load(Ordering::Relaxed),
            last_affected_id: None,
        });
        async move {
            if sleep {
                future::pending::<()>().await;
            }
            result
        }
    }

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        self.state.disconnects.fetch_add(1, Ordering::Relaxed);
        async { Ok(()) }
    }
}
