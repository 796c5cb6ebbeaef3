//! Relational table stores.
//!
//! A [`TableStore`] replaces whole tables. Implementations write new contents into a staging
//! table in bounded batches and then swap it in atomically, so a failed replace never leaves a
//! partially written table visible under the target name.

mod sqlite;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::types::DataSet;

pub use sqlite::SqliteStore;

/// Prefix of the table new contents are staged in before the swap.
pub const STAGING_PREFIX: &str = "__staging_";

/// Default number of rows per insert batch.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Options controlling table writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Rows per insert batch.
    ///
    /// Bounds statement/working-set size only; the replace is atomic regardless of this value.
    pub batch_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Minimal stats reported by a successful replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    /// Rows written.
    pub rows: usize,
    /// Insert batches executed.
    pub batches: usize,
}

/// A relational store that can destructively replace named tables.
pub trait TableStore {
    /// Drop `table` (schema and contents) if it exists and recreate it from `data`.
    ///
    /// On error the store must be left as it was before the call.
    fn replace_table(&mut self, table: &str, data: &DataSet, options: &WriteOptions) -> StoreResult<WriteStats>;

    /// Returns `true` if `table` exists.
    fn table_exists(&self, table: &str) -> StoreResult<bool>;
}

impl<S: TableStore + ?Sized> TableStore for &mut S {
    fn replace_table(&mut self, table: &str, data: &DataSet, options: &WriteOptions) -> StoreResult<WriteStats> {
        (**self).replace_table(table, data, options)
    }

    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        (**self).table_exists(table)
    }
}

/// Check that `name` can be used as a target table name.
pub fn validate_table_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("table name is empty");
    }
    if name.contains('\0') {
        return Err("table name contains a NUL byte");
    }
    // SQLite identifiers are case-insensitive.
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("sqlite_") {
        return Err("names starting with 'sqlite_' are reserved");
    }
    if lower.starts_with(STAGING_PREFIX) {
        return Err("names starting with the staging prefix are reserved");
    }
    Ok(())
}

/// Quote an SQL identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn reserved_and_empty_names_are_rejected() {
        assert!(validate_table_name("orders").is_ok());
        assert!(validate_table_name("category translation").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("   ").is_err());
        assert!(validate_table_name("SQLITE_master").is_err());
        assert!(validate_table_name("__staging_orders").is_err());
        assert!(validate_table_name("__Staging_orders").is_err());
        assert!(validate_table_name("__STAGING_ORDERS").is_err());
        assert!(validate_table_name("a\0b").is_err());
    }
}
