use crate::{SqliteConnection, SqliteSqlWriter};
use keel_core::{Driver, Error, PoolConfig, Result};
use rusqlite::ErrorCode;
use std::{
    future::Future,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

pub(crate) type Anchor = Arc<Mutex<Option<rusqlite::Connection>>>;

/// Opens SQLite databases, `:memory:` (or an empty database) is an in memory database
/// shared by all the connections of this driver.
///
/// The memory database lives as long as the driver (or any clone of it): the driver keeps
/// one connection of its own open next to the pooled ones.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    memory_name: String,
    anchor: Anchor,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self {
            memory_name: format!("keel-{}", Uuid::new_v4().simple()),
            anchor: Default::default(),
        }
    }

    pub(crate) fn path(&self, config: &PoolConfig) -> String {
        if Self::is_memory(config) {
            format!("file:{}?mode=memory&cache=shared", self.memory_name)
        } else {
            config.database.to_string()
        }
    }

    fn is_memory(config: &PoolConfig) -> bool {
        matches!(config.database.as_ref(), "" | ":memory:")
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type SqlWriter = SqliteSqlWriter;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter
    }

    fn connect(&self, config: &PoolConfig) -> impl Future<Output = Result<SqliteConnection>> + Send {
        if !matches!(
            config.charset.to_ascii_lowercase().as_str(),
            "utf8" | "utf-8" | "utf8mb4"
        ) {
            log::warn!(
                "SQLite stores text as UTF-8, ignoring the charset `{}`",
                config.charset
            );
        }
        if !config.autocommit {
            log::warn!("SQLite connections always run in autocommit mode");
        }
        let anchor = Self::is_memory(config).then(|| self.anchor.clone());
        SqliteConnection::open(self.path(config), anchor)
    }

    fn is_connection_error(&self, error: &Error) -> bool {
        error.chain().any(|e| {
            matches!(
                e.downcast_ref::<rusqlite::Error>()
                    .and_then(rusqlite::Error::sqlite_error_code),
                Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
            )
        })
    }
}
