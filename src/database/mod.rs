//! Database abstraction layer
//!
//! SQLite persistence through SQLx.

pub mod connection;

pub use connection::{is_unique_violation, DatabaseManager};
