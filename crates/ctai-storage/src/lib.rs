//! ClearTaxers-Ai Storage Layer
//!
//! A small persistent key/value store playing the role of browser local
//! storage. Multi-key writes are transactional so related keys never
//! diverge.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
