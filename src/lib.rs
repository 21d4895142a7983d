//! Typed entities over pooled SQL connections.
//!
//! A default only applies to a field that can be NULL:
//! ```
//! use keel::Entity;
//!
//! fn next_id() -> i64 {
//!     7
//! }
//!
//! #[derive(Entity)]
//! struct Ticket {
//!     #[keel(primary_key, default_with = next_id)]
//!     id: Option<i64>,
//! }
//!
//! assert_eq!(Ticket::schema().insert_sql(), "INSERT INTO `Ticket` (`id`) VALUES (?)");
//! ```
//! The derive rejects it anywhere else:
//! ```compile_fail
//! use keel::Entity;
//!
//! fn next_id() -> i64 {
//!     7
//! }
//!
//! #[derive(Entity)]
//! struct Ticket {
//!     #[keel(primary_key, default_with = next_id)]
//!     id: i64,
//! }
//! ```
pub use keel_core::*;
pub use keel_macros::Entity;
