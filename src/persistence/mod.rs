//! Local persistence and database migrations.
//!
//! Pullboard stores per-user filter preferences in a local `SQLite` database
//! when one is configured, and in memory otherwise. The schema is managed
//! with Diesel migrations so the database can be created and upgraded
//! consistently across machines.

use diesel::Connection;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;

mod error;
mod migrator;
pub mod preferences;

pub use error::PersistenceError;
pub use migrator::{CURRENT_SCHEMA_VERSION, MIGRATIONS, SchemaVersion, migrate_database};
pub use preferences::{
    InMemoryPreferenceStore, PreferenceKey, PreferenceStore, SqlitePreferenceStore, UserScope,
};

/// Opens a connection to `database_url` with foreign keys enforced.
fn establish_connection(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    let trimmed = database_url.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::BlankDatabaseUrl);
    }

    let mut connection =
        SqliteConnection::establish(trimmed).map_err(|error| PersistenceError::ConnectionFailed {
            message: error.to_string(),
        })?;

    sql_query("PRAGMA foreign_keys = ON;")
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| PersistenceError::ConnectionFailed {
            message: format!("failed to enable foreign keys: {error}"),
        })?;

    Ok(connection)
}
