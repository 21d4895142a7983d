mod as_value;
mod config;
mod connection;
mod driver;
mod entity;
mod error;
mod executor;
mod field;
mod filter;
mod pool;
mod query;
mod schema;
mod sql_writer;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use config::*;
pub use connection::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use field::*;
pub use filter::*;
pub use pool::*;
pub use query::*;
pub use schema::*;
pub use sql_writer::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
