use rusqlite::{Connection, Transaction};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use crate::errors::ServerError;

// Thread-local connection slots, one per database path.
thread_local! {
    static DB_CONNS: RefCell<HashMap<String, Connection>> = RefCell::new(HashMap::new());
}

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

#[derive(Clone, Debug)]
pub struct Database {
    path: String,
}

fn open(path: &str) -> Result<Connection, ServerError> {
    let conn = Connection::open(path)
        .map_err(|e| ServerError::DbError(format!("Open DB failed: {e}")))?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| ServerError::DbError(format!("Enable foreign keys failed: {e}")))?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| ServerError::DbError(format!("Set busy timeout failed: {e}")))?;
    Ok(conn)
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ServerError>,
    {
        DB_CONNS
            .try_with(|cell| {
                let mut slots = cell.borrow_mut();
                if !slots.contains_key(&self.path) {
                    let conn = open(&self.path)?;
                    slots.insert(self.path.clone(), conn);
                }
                match slots.get_mut(&self.path) {
                    Some(conn) => f(conn),
                    None => Err(ServerError::InternalError),
                }
            })
            .map_err(|_| ServerError::InternalError)?
    }

    /// Runs the closure inside a SQLite transaction, committing on `Ok`.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, ServerError>,
    {
        self.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| ServerError::DbError(format!("Begin transaction failed: {e}")))?;
            let out = f(&tx)?;
            tx.commit()
                .map_err(|e| ServerError::DbError(format!("Commit failed: {e}")))?;
            Ok(out)
        })
    }
}

/// Apply the bundled schema to an open connection.
pub fn apply_schema(conn: &Connection) -> Result<(), ServerError> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| ServerError::DbError(format!("Failed to apply schema: {e}")))
}

/// Initialize database from a SQL schema file, falling back to the bundled
/// schema when the file is missing.
pub fn init_db(db: &Database, schema_path: &str) -> Result<(), ServerError> {
    let schema_sql = match fs::read_to_string(schema_path) {
        Ok(sql) => sql,
        Err(e) => {
            tracing::warn!(schema_path, error = %e, "schema file unreadable, using bundled schema");
            SCHEMA_SQL.to_string()
        }
    };

    db.with_conn(|conn| {
        conn.execute_batch(&schema_sql)
            .map_err(|e| ServerError::DbError(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    tracing::info!(path = db.path(), schema_path, "database initialized");
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", true).unwrap();
    apply_schema(&conn).unwrap();
    conn
}
