//! Embedded migrations for the preferences database.

use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::PersistenceError;

/// Embedded Diesel migrations shipped with the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Schema version of the newest migration in this repository.
pub const CURRENT_SCHEMA_VERSION: &str = "20261001000000";

/// A Diesel migration version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    /// Returns the inner version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the newest schema this build knows about.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.0 == CURRENT_SCHEMA_VERSION
    }
}

/// Brings the preferences schema up to date and records the resulting
/// version in telemetry.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the database cannot be opened, a
/// migration fails, or no applied migration can be read back.
pub fn migrate_database(
    database_url: &str,
    telemetry: &dyn TelemetrySink,
) -> Result<SchemaVersion, PersistenceError> {
    let mut connection = super::establish_connection(database_url)?;

    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| PersistenceError::MigrationFailed {
            message: error.to_string(),
        })?;
    if applied.is_empty() {
        tracing::debug!("preferences schema already up to date");
    } else {
        tracing::info!("applied {} preferences migration(s)", applied.len());
    }

    let schema_version = latest_applied_version(&mut connection)?;
    telemetry.record(TelemetryEvent::SchemaVersionRecorded {
        schema_version: schema_version.as_str().to_owned(),
    });

    Ok(schema_version)
}

fn latest_applied_version(
    connection: &mut SqliteConnection,
) -> Result<SchemaVersion, PersistenceError> {
    connection
        .applied_migrations()
        .map_err(|error| PersistenceError::SchemaVersionQueryFailed {
            message: error.to_string(),
        })?
        .into_iter()
        .map(|version| version.to_string())
        .max()
        .map(SchemaVersion)
        .ok_or(PersistenceError::MissingSchemaVersion)
}
