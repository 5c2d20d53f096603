//! Behavioural tests for migrations and `SQLite`-backed filter preferences.

mod support;

use std::sync::Arc;

use futures::executor::block_on;
use pullboard::azure::models::test_support::repository;
use pullboard::persistence::{
    CURRENT_SCHEMA_VERSION, PersistenceError, SqlitePreferenceStore, UserScope, migrate_database,
};
use pullboard::pipeline::{FilterChange, FilterController, FilterOptions, SelectedEntities};
use pullboard::telemetry::TelemetryEvent;
use pullboard::telemetry::test_support::RecordingSink;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tempfile::TempDir;

use support::create_temp_dir;

#[derive(ScenarioState, Default)]
struct PreferenceState {
    database_url: Slot<String>,
    temp_dir: Slot<TempDir>,
    schema_version: Slot<String>,
    error: Slot<PersistenceError>,
    telemetry: Slot<Arc<RecordingSink>>,
    restored: Slot<SelectedEntities>,
}

#[fixture]
fn preference_state() -> PreferenceState {
    PreferenceState::default()
}

fn options() -> FilterOptions {
    FilterOptions {
        repositories: vec![repository("r1", "core"), repository("r2", "web")],
        ..FilterOptions::default()
    }
}

fn database_url(preference_state: &PreferenceState) -> String {
    preference_state
        .database_url
        .get()
        .unwrap_or_else(|| panic!("database URL not set"))
}

fn controller_for(preference_state: &PreferenceState, user: &str) -> FilterController {
    let store = SqlitePreferenceStore::new(database_url(preference_state))
        .unwrap_or_else(|error| panic!("failed to open store: {error}"));
    FilterController::new(Arc::new(store), UserScope::new(user.trim_matches('"')))
}

fn use_temporary_database(preference_state: &PreferenceState) {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("pullboard.sqlite");
    preference_state
        .database_url
        .set(path.to_string_lossy().to_string());
    preference_state.temp_dir.set(temp_dir);
}

// --- Given steps ---

#[given("a temporary database file")]
fn temporary_database(preference_state: &PreferenceState) {
    use_temporary_database(preference_state);
}

#[given("a blank database URL")]
fn blank_database_url(preference_state: &PreferenceState) {
    preference_state.database_url.set("   ".to_owned());
}

#[given("a migrated temporary database")]
fn migrated_temporary_database(preference_state: &PreferenceState) {
    use_temporary_database(preference_state);
    run_migration(preference_state);
    assert!(
        preference_state.error.with_ref(|_| ()).is_none(),
        "migrating the temporary database failed"
    );
}

// --- When steps ---

#[when("the database is migrated")]
fn migrate(preference_state: &PreferenceState) {
    run_migration(preference_state);
}

fn run_migration(preference_state: &PreferenceState) {
    let sink = Arc::new(RecordingSink::default());
    match migrate_database(&database_url(preference_state), sink.as_ref()) {
        Ok(version) => preference_state
            .schema_version
            .set(version.as_str().to_owned()),
        Err(error) => preference_state.error.set(error),
    }
    preference_state.telemetry.set(sink);
}

#[when("user {user} selects the repository {name}")]
fn select_repository(preference_state: &PreferenceState, user: String, name: String) {
    let controller = controller_for(preference_state, &user);
    let selected = options()
        .repository_named(name.trim_matches('"'))
        .cloned()
        .into_iter()
        .collect();

    block_on(controller.apply(FilterChange::Repositories(selected)))
        .unwrap_or_else(|error| panic!("saving the selection failed: {error}"));
}

#[when("user {user} restores their selection in a new session")]
fn restore_selection(preference_state: &PreferenceState, user: String) {
    let controller = controller_for(preference_state, &user);
    let _restored = block_on(controller.restore(&options()));
    preference_state.restored.set(controller.selected());
}

// --- Then steps ---

#[then("the current schema version is recorded in telemetry")]
fn schema_version_recorded(preference_state: &PreferenceState) {
    assert_eq!(
        preference_state.schema_version.get().as_deref(),
        Some(CURRENT_SCHEMA_VERSION)
    );
    let events = preference_state
        .telemetry
        .with_ref(|sink| sink.take())
        .unwrap_or_else(|| panic!("telemetry sink not initialised"));
    assert_eq!(
        events,
        vec![TelemetryEvent::SchemaVersionRecorded {
            schema_version: CURRENT_SCHEMA_VERSION.to_owned(),
        }]
    );
}

#[then("migration fails because the database URL is blank")]
fn migration_fails_blank(preference_state: &PreferenceState) {
    assert_eq!(
        preference_state.error.get(),
        Some(PersistenceError::BlankDatabaseUrl)
    );
}

#[then("the restored repositories are {names}")]
fn restored_repositories(preference_state: &PreferenceState, names: String) {
    let restored: Vec<String> = preference_state
        .restored
        .with_ref(|selected| {
            selected
                .repositories
                .iter()
                .map(|repository| repository.name.clone())
                .collect()
        })
        .unwrap_or_else(|| panic!("selection was not restored"));
    let expected: Vec<&str> = names.trim_matches('"').split(',').collect();
    assert_eq!(restored, expected);
}

#[then("no repositories are restored")]
fn nothing_restored(preference_state: &PreferenceState) {
    let count = preference_state
        .restored
        .with_ref(|selected| selected.repositories.len())
        .unwrap_or_else(|| panic!("selection was not restored"));
    assert_eq!(count, 0);
}

#[scenario(path = "tests/features/preference_persistence.feature", index = 0)]
fn migrations_record_schema_version(preference_state: PreferenceState) {
    let _ = preference_state;
}

#[scenario(path = "tests/features/preference_persistence.feature", index = 1)]
fn migrations_fail_on_blank_database_url(preference_state: PreferenceState) {
    let _ = preference_state;
}

#[scenario(path = "tests/features/preference_persistence.feature", index = 2)]
fn selection_survives_a_new_session(preference_state: PreferenceState) {
    let _ = preference_state;
}

#[scenario(path = "tests/features/preference_persistence.feature", index = 3)]
fn selections_are_scoped_per_user(preference_state: PreferenceState) {
    let _ = preference_state;
}
