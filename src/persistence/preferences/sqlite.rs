//! `SQLite` implementation of the preference store.

use async_trait::async_trait;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;
use serde_json::Value;

use super::{PreferenceKey, PreferenceStore, UserScope};
use crate::persistence::{PersistenceError, establish_connection};

const PREFERENCES_TABLE: &str = "preferences";

/// SQLite-backed preference store.
///
/// A connection is opened per call; the database must have been migrated
/// with [`crate::persistence::migrate_database`].
#[derive(Debug, Clone)]
pub struct SqlitePreferenceStore {
    database_url: String,
}

impl SqlitePreferenceStore {
    /// Create a store targeting the configured `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string,
        })
    }

    fn read(&self, key: PreferenceKey, scope: &UserScope) -> Result<Option<Value>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            value: String,
        }

        let mut connection = establish_connection(&self.database_url)?;
        let row: Option<Row> =
            sql_query("SELECT value FROM preferences WHERE scope = ? AND key = ? LIMIT 1;")
                .bind::<Text, _>(scope.as_str())
                .bind::<Text, _>(key.as_str())
                .get_result(&mut connection)
                .optional()
                .map_err(|error| {
                    map_error_with_schema_check(&mut connection, &error, |message| {
                        PersistenceError::QueryFailed { message }
                    })
                })?;

        row.map(|stored| {
            serde_json::from_str(&stored.value).map_err(|error| PersistenceError::InvalidValue {
                message: format!("{key} for scope {}: {error}", scope.as_str()),
            })
        })
        .transpose()
    }

    fn write(
        &self,
        key: PreferenceKey,
        value: &Value,
        scope: &UserScope,
    ) -> Result<(), PersistenceError> {
        let encoded = serde_json::to_string(value).map_err(|error| PersistenceError::InvalidValue {
            message: error.to_string(),
        })?;

        let mut connection = establish_connection(&self.database_url)?;
        sql_query(
            "INSERT INTO preferences (scope, key, value) VALUES (?, ?, ?) \
             ON CONFLICT(scope, key) DO UPDATE SET \
               value = excluded.value, \
               updated_at = CURRENT_TIMESTAMP;",
        )
        .bind::<Text, _>(scope.as_str())
        .bind::<Text, _>(key.as_str())
        .bind::<Text, _>(encoded)
        .execute(&mut connection)
        .map(drop)
        .map_err(|error| {
            map_error_with_schema_check(&mut connection, &error, |message| {
                PersistenceError::WriteFailed { message }
            })
        })
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get_value(
        &self,
        key: PreferenceKey,
        scope: &UserScope,
    ) -> Result<Option<Value>, PersistenceError> {
        self.read(key, scope)
    }

    async fn set_value(
        &self,
        key: PreferenceKey,
        value: &Value,
        scope: &UserScope,
    ) -> Result<(), PersistenceError> {
        self.write(key, value, scope)
    }
}

fn preferences_table_exists(
    connection: &mut SqliteConnection,
) -> Result<bool, diesel::result::Error> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        count: i64,
    }

    let row: Row =
        sql_query("SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;")
            .bind::<Text, _>(PREFERENCES_TABLE)
            .get_result(connection)?;

    Ok(row.count > 0)
}

fn map_error_with_schema_check<F>(
    connection: &mut SqliteConnection,
    error: &diesel::result::Error,
    create_error: F,
) -> PersistenceError
where
    F: Fn(String) -> PersistenceError,
{
    match preferences_table_exists(connection) {
        Ok(false) => PersistenceError::SchemaNotInitialised,
        Ok(true) => create_error(error.to_string()),
        Err(check_error) => create_error(format!(
            "schema presence check failed: {check_error}; original error: {error}"
        )),
    }
}
