use crate::{MySQLConnection, MySQLSqlWriter};
use keel_core::{Context, Driver, Error, PoolConfig, Result};
use mysql_async::{Conn, Opts, OptsBuilder};
use std::future::Future;

#[derive(Debug, Clone, Copy, Default)]
pub struct MySQLDriver;
impl MySQLDriver {
    pub const fn new() -> Self {
        Self
    }

    /// Connection options of every connection opened with `config`.
    ///
    /// Writes report the rows they matched rather than the rows they changed, an update
    /// storing the same values still counts as one row.
    pub fn opts(config: &PoolConfig) -> Opts {
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        OptsBuilder::default()
            .ip_or_hostname(config.host.to_string())
            .tcp_port(config.port)
            .user(optional(&config.user))
            .pass(optional(&config.password))
            .db_name(optional(&config.database))
            .client_found_rows(true)
            .init(vec![
                format!("SET NAMES {}", config.charset),
                format!("SET autocommit={}", config.autocommit as u8),
            ])
            .into()
    }
}

impl Driver for MySQLDriver {
    type Connection = MySQLConnection;
    type SqlWriter = MySQLSqlWriter;

    const NAME: &'static str = "mysql";

    fn sql_writer(&self) -> Self::SqlWriter {
        MySQLSqlWriter
    }

    fn connect(&self, config: &PoolConfig) -> impl Future<Output = Result<MySQLConnection>> + Send {
        let opts = Self::opts(config);
        let context = format!(
            "While trying to connect to `{}:{}/{}`",
            config.host, config.port, config.database
        );
        async move {
            match Conn::new(opts).await.context(context) {
                Ok(connection) => Ok(MySQLConnection { connection }),
                Err(error) => {
                    log::error!("{:#}", error);
                    Err(error)
                }
            }
        }
    }

    fn is_connection_error(&self, error: &Error) -> bool {
        error.chain().any(|e| {
            matches!(
                e.downcast_ref::<mysql_async::Error>(),
                Some(mysql_async::Error::Io(..))
            )
        })
    }
}
