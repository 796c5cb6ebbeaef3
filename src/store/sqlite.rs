use std::path::Path;

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, ToSql};

use crate::error::{StoreError, StoreResult};
use crate::types::{DataSet, DataType, Value};

use super::{quote_ident, TableStore, WriteOptions, WriteStats, STAGING_PREFIX};

/// SQLite-backed [`TableStore`].
///
/// SQLite has transactional DDL, so staging, dropping the old table and renaming the staged
/// table all happen in one transaction: readers see either the old table or the new one.
pub struct SqliteStore {
    conn: Connection,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        // Views built on loaded tables must not block the rename of the staging table while the
        // target name is momentarily absent.
        conn.pragma_update(None, "legacy_alter_table", true)?;
        Ok(Self { conn })
    }

    /// Borrow the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    /// Column names of `table`, in declaration order.
    pub fn column_names(&self, table: &str) -> StoreResult<Vec<String>> {
        let sql = format!("SELECT * FROM {} LIMIT 0", quote_ident(table));
        let stmt = self.conn.prepare(&sql)?;
        Ok(stmt.column_names().into_iter().map(str::to_owned).collect())
    }

    /// All rows of `table` in insertion order.
    ///
    /// Booleans come back as `Int64` (SQLite has no boolean storage class).
    pub fn select_all(&self, table: &str) -> StoreResult<Vec<Vec<Value>>> {
        let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_ident(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let n = stmt.column_count();
        let rows = stmt.query_map([], |row| {
            (0..n)
                .map(|i| row.get_ref(i).map(value_from_sql))
                .collect::<rusqlite::Result<Vec<Value>>>()
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl TableStore for SqliteStore {
    fn replace_table(&mut self, table: &str, data: &DataSet, options: &WriteOptions) -> StoreResult<WriteStats> {
        if options.batch_size == 0 {
            return Err(StoreError::InvalidBatchSize);
        }
        if data.schema.is_empty() {
            return Err(StoreError::EmptySchema {
                table: table.to_owned(),
            });
        }

        let target = quote_ident(table);
        let staging = quote_ident(&format!("{STAGING_PREFIX}{table}"));
        let columns: Vec<String> = data.schema.fields.iter().map(|f| quote_ident(&f.name)).collect();
        let column_defs: Vec<String> = data
            .schema
            .fields
            .iter()
            .zip(&columns)
            .map(|(f, name)| format!("{name} {}", sql_type(f.data_type)))
            .collect();
        let insert_sql = format!(
            "INSERT INTO {staging} ({}) VALUES ({})",
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        // Dropping the transaction without commit rolls everything back.
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {staging}; CREATE TABLE {staging} ({});",
            column_defs.join(", ")
        ))?;

        let mut batches = 0usize;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for batch in data.batches(options.batch_size) {
                for row in batch {
                    stmt.execute(rusqlite::params_from_iter(row.iter()))?;
                }
                batches += 1;
                tracing::debug!(table, batch = batches, rows = batch.len(), "staged batch");
            }
        }

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {target}; ALTER TABLE {staging} RENAME TO {target};"
        ))?;
        tx.commit()?;

        Ok(WriteStats {
            rows: data.row_count(),
            batches,
        })
    }

    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Int64(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float64(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Utf8(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn sql_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Int64 | DataType::Bool => "INTEGER",
        DataType::Float64 => "REAL",
        DataType::Utf8 => "TEXT",
    }
}

fn value_from_sql(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Utf8(String::from_utf8_lossy(t).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Schema};

    fn dataset(rows: usize) -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("city", DataType::Utf8),
            Field::new("active", DataType::Bool),
        ]);
        let rows = (0..rows as i64)
            .map(|i| vec![Value::Int64(i), Value::Utf8(format!("city-{i}")), Value::Bool(i % 2 == 0)])
            .collect();
        DataSet::new(schema, rows)
    }

    #[test]
    fn replace_creates_table_and_counts_batches() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let stats = store
            .replace_table("sellers", &dataset(5), &WriteOptions { batch_size: 2 })
            .unwrap();

        assert_eq!(stats, WriteStats { rows: 5, batches: 3 });
        assert_eq!(store.row_count("sellers").unwrap(), 5);
        assert_eq!(store.column_names("sellers").unwrap(), vec!["id", "city", "active"]);
        assert!(!store.table_exists("__staging_sellers").unwrap());
    }

    #[test]
    fn replace_drops_previous_schema() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch("CREATE TABLE sellers (legacy TEXT); INSERT INTO sellers VALUES ('x');")
            .unwrap();

        store
            .replace_table("sellers", &dataset(1), &WriteOptions::default())
            .unwrap();

        assert_eq!(store.column_names("sellers").unwrap(), vec!["id", "city", "active"]);
        assert_eq!(
            store.select_all("sellers").unwrap(),
            vec![vec![Value::Int64(0), Value::Utf8("city-0".to_string()), Value::Int64(1)]]
        );
    }

    #[test]
    fn dependent_views_survive_replace() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .replace_table("sellers", &dataset(2), &WriteOptions::default())
            .unwrap();
        store
            .connection()
            .execute_batch("CREATE VIEW active_sellers AS SELECT id FROM sellers WHERE active = 1;")
            .unwrap();

        store
            .replace_table("sellers", &dataset(4), &WriteOptions::default())
            .unwrap();

        assert_eq!(store.row_count("active_sellers").unwrap(), 2);
    }

    #[test]
    fn empty_schema_and_zero_batch_size_are_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let empty = DataSet::new(Schema::default(), Vec::new());

        assert!(matches!(
            store.replace_table("t", &empty, &WriteOptions::default()),
            Err(StoreError::EmptySchema { .. })
        ));
        assert!(matches!(
            store.replace_table("t", &dataset(1), &WriteOptions { batch_size: 0 }),
            Err(StoreError::InvalidBatchSize)
        ));
        assert!(!store.table_exists("t").unwrap());
    }
}
