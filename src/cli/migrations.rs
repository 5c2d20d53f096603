//! Database migration operations.

use pullboard::persistence::{PersistenceError, migrate_database};
use pullboard::telemetry::StderrJsonlTelemetrySink;
use pullboard::{IntakeError, PullboardConfig};

/// Message reported when `--migrate-db` is used without a database.
const MISSING_DATABASE_URL: &str = "database URL is required (use --database-url)";

/// Runs database migrations.
///
/// # Errors
///
/// Returns [`IntakeError::Configuration`] if the database URL is missing or blank.
/// Returns [`IntakeError::Io`] for connection or migration failures.
pub fn run(config: &PullboardConfig) -> Result<(), IntakeError> {
    let database_url =
        config
            .database_url
            .as_deref()
            .ok_or_else(|| IntakeError::Configuration {
                message: MISSING_DATABASE_URL.to_owned(),
            })?;

    let telemetry = StderrJsonlTelemetrySink;
    migrate_database(database_url, &telemetry)
        .map(drop)
        .map_err(|error| map_persistence_error(&error))
}

/// Maps a persistence error to an intake error.
///
/// A blank URL becomes [`IntakeError::Configuration`]; connection, migration
/// and query failures become [`IntakeError::Io`].
pub(crate) fn map_persistence_error(error: &PersistenceError) -> IntakeError {
    if matches!(error, PersistenceError::BlankDatabaseUrl) {
        IntakeError::Configuration {
            message: error.to_string(),
        }
    } else {
        IntakeError::Io {
            message: error.to_string(),
        }
    }
}
