//! Active pull request listing operation.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pullboard::azure::{
    AccessToken, AvatarGateway, AzureDevOpsGateway, CommentThreadGateway, IntakeOptions,
    OrganizationUrl, ProjectGateway, ProjectIntake, ProjectName,
};
use pullboard::persistence::{
    InMemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore, UserScope, migrate_database,
};
use pullboard::pipeline::display::count_title;
use pullboard::pipeline::{
    EnrichmentCaches, EnrichmentCoordinator, FilterChange, FilterController, FilterOptions,
    OtherFlag,
};
use pullboard::telemetry::{
    NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink,
};
use pullboard::{IntakeError, PullboardConfig};

use super::migrations::map_persistence_error;
use super::output::{ListingView, write_listing};

/// Lists the active pull requests of the configured project.
///
/// # Errors
///
/// Returns [`IntakeError::Configuration`] if required configuration is missing.
/// Returns gateway errors when the project, user or listing cannot be loaded.
pub async fn run(config: &PullboardConfig) -> Result<(), IntakeError> {
    let telemetry: Arc<dyn TelemetrySink> = Arc::new(StderrJsonlTelemetrySink);
    let mut stdout = io::stdout().lock();
    run_with_gateway_builder(
        config,
        AzureDevOpsGateway::for_token,
        telemetry,
        Utc::now(),
        &mut stdout,
    )
    .await
}

/// Lists pull requests using a custom gateway builder.
///
/// This function is exposed for testing with fake gateways.
pub async fn run_with_gateway_builder<G, F, W>(
    config: &PullboardConfig,
    build_gateway: F,
    telemetry: Arc<dyn TelemetrySink>,
    now: DateTime<Utc>,
    writer: &mut W,
) -> Result<(), IntakeError>
where
    G: ProjectGateway + CommentThreadGateway + AvatarGateway + 'static,
    F: FnOnce(&AccessToken, &OrganizationUrl, &str) -> Result<G, IntakeError>,
    W: Write,
{
    let organization = OrganizationUrl::parse(config.require_organization_url()?)?;
    let project_name = ProjectName::new(config.require_project()?)?;
    let token = AccessToken::new(config.resolve_token()?)?;
    let sort_state = config.sort_state()?;

    let gateway = Arc::new(build_gateway(&token, &organization, &config.graph_url)?);
    let intake_options = IntakeOptions {
        only_mine: config.only_mine,
        page_size: config.page_size,
    };
    let snapshot = ProjectIntake::new(gateway.as_ref())
        .load(&project_name, intake_options, now)
        .await?;

    let options = FilterOptions::collect(
        &snapshot.project.id,
        &snapshot.repositories,
        &snapshot.pull_requests,
    );
    let scope = UserScope::new(
        config
            .user_scope
            .as_deref()
            .unwrap_or(&snapshot.current_user.id),
    );
    let controller = FilterController::new(open_preference_store(config), scope);
    controller.restore(&options).await;
    if config.selects_filters() {
        apply_requested_filters(&controller, config, &options).await?;
    }

    let all = &snapshot.pull_requests;
    let visible = controller.visible(all);
    let filtering = controller.selection().is_filtering();
    telemetry.record(TelemetryEvent::PullRequestsLoaded {
        project: snapshot.project.name.clone(),
        total: all.len(),
        visible: visible.len(),
    });

    let coordinator = EnrichmentCoordinator::new(
        Arc::new(EnrichmentCaches::new()),
        Arc::clone(&gateway) as Arc<dyn CommentThreadGateway>,
        gateway as Arc<dyn AvatarGateway>,
        config.pool_config(),
    )
    .with_telemetry(telemetry);
    coordinator.ensure_loaded(&visible);
    coordinator.settle().await;
    let enrichment = coordinator.state();
    coordinator.teardown();

    let rows = sort_state.apply(&visible);
    write_listing(
        writer,
        &ListingView {
            title: count_title(all.len(), visible.len(), filtering),
            rows: &rows,
            enrichment: &enrichment,
            current_user_id: &snapshot.current_user.id,
            base_url: organization.as_url().as_str(),
        },
    )
}

/// Opens the `SQLite` store when a database is configured, migrating it
/// first. Without a database, or when it cannot be opened, filters are kept
/// in a process-local store.
fn open_preference_store(config: &PullboardConfig) -> Arc<dyn PreferenceStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        return Arc::new(InMemoryPreferenceStore::new());
    };
    let opened = migrate_database(database_url, &NoopTelemetrySink)
        .and_then(|_| SqlitePreferenceStore::new(database_url));
    match opened {
        Ok(store) => Arc::new(store),
        Err(error) => {
            tracing::warn!(
                "preferences database {database_url} unavailable, keeping filters for this run only: {}",
                map_persistence_error(&error)
            );
            Arc::new(InMemoryPreferenceStore::new())
        }
    }
}

/// Replaces the dimensions named on this invocation with the matching
/// options. Names that match nothing are logged and skipped.
async fn apply_requested_filters(
    controller: &FilterController,
    config: &PullboardConfig,
    options: &FilterOptions,
) -> Result<(), IntakeError> {
    let mut changes = Vec::new();
    if config.repositories.is_some() {
        changes.push(FilterChange::Repositories(resolve_names(
            "repository",
            &config.repository_names(),
            |name| options.repository_named(name),
        )));
    }
    if config.creators.is_some() {
        changes.push(FilterChange::Creators(resolve_names(
            "creator",
            &config.creator_names(),
            |name| options.creator_named(name),
        )));
    }
    if config.reviewers.is_some() {
        changes.push(FilterChange::Reviewers(resolve_names(
            "reviewer",
            &config.reviewer_names(),
            |name| options.reviewer_named(name),
        )));
    }
    if config.drafts_only {
        changes.push(FilterChange::Other(vec![OtherFlag::IsDraft]));
    }

    for change in changes {
        controller
            .apply(change)
            .await
            .map_err(|error| map_persistence_error(&error))?;
    }
    Ok(())
}

fn resolve_names<'a, T: Clone + 'a>(
    kind: &str,
    names: &[&str],
    lookup: impl Fn(&str) -> Option<&'a T>,
) -> Vec<T> {
    names
        .iter()
        .filter_map(|name| {
            let found = lookup(name);
            if found.is_none() {
                tracing::warn!("no {kind} named '{name}' in this project");
            }
            found.cloned()
        })
        .collect()
}
