//! Error types for local persistence operations.

use thiserror::Error;

/// Errors returned while migrating the local `SQLite` database or reading and
/// writing stored preferences.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The preferences table does not exist yet.
    #[error("preferences table is missing (run with --migrate-db first)")]
    SchemaNotInitialised,

    /// Reading a preference failed.
    #[error("failed to read preference: {message}")]
    QueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// Writing a preference failed.
    #[error("failed to write preference: {message}")]
    WriteFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// A stored or supplied value was not valid JSON.
    #[error("preference value is not valid JSON: {message}")]
    InvalidValue {
        /// Error detail from `serde_json`.
        message: String,
    },
}
