//! Behavioural tests for comment-count and avatar enrichment against a mock
//! Azure DevOps server.

mod support;

use std::sync::Arc;

use pullboard::azure::models::test_support::{identity, pull_request, repository};
use pullboard::azure::{AvatarDescriptor, AvatarGateway, CommentThreadGateway};
use pullboard::pipeline::display::{comment_cell, comment_tooltip};
use pullboard::pipeline::{
    EnrichmentCaches, EnrichmentCoordinator, EnrichmentState, FetchPool,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::{Value, json};
use wiremock::ResponseTemplate;

use support::azure_server::{MockOrganization, ensure_organization, thread_json, threads_path};

const AVATAR_PAYLOAD: &str = "iVBORw==";

#[derive(ScenarioState, Default)]
struct EnrichmentScenario {
    organization: Slot<MockOrganization>,
    state: Slot<EnrichmentState>,
}

#[fixture]
fn enrichment_scenario() -> EnrichmentScenario {
    EnrichmentScenario::default()
}

fn organization(scenario: &EnrichmentScenario) -> MockOrganization {
    ensure_organization(&scenario.organization)
}

fn enrich(scenario: &EnrichmentScenario, coordinators: usize) {
    let organization = organization(scenario);
    let gateway = organization.gateway();
    let caches = Arc::new(EnrichmentCaches::new());
    let visible = vec![pull_request(
        42,
        &repository("r1", "core"),
        &identity("a", "Ada"),
    )];

    for _ in 0..coordinators {
        let coordinator = EnrichmentCoordinator::new(
            Arc::clone(&caches),
            Arc::clone(&gateway) as Arc<dyn CommentThreadGateway>,
            Arc::clone(&gateway) as Arc<dyn AvatarGateway>,
            FetchPool::default(),
        );
        let state = organization.block_on(async {
            coordinator.ensure_loaded(&visible);
            coordinator.settle().await;
            coordinator.state()
        });
        scenario.state.set(state);
    }
}

fn state(scenario: &EnrichmentScenario) -> EnrichmentState {
    scenario
        .state
        .get()
        .unwrap_or_else(|| panic!("enrichment has not run"))
}

// --- Given steps ---

#[given("an Azure DevOps server where pull request 42 has threads {statuses}")]
fn seed_threads(enrichment_scenario: &EnrichmentScenario, statuses: String) {
    let threads: Vec<Value> = statuses
        .trim_matches('"')
        .split(',')
        .enumerate()
        .map(|(index, status)| thread_json(index + 1, status.trim()))
        .collect();
    let organization = organization(enrichment_scenario);
    organization.mount_threads(
        "r1",
        42,
        ResponseTemplate::new(200).set_body_json(json!({ "value": threads })),
    );
    organization.mount_avatars(AVATAR_PAYLOAD);
}

#[given("an Azure DevOps server where pull request 42 thread requests fail")]
fn seed_failing_threads(enrichment_scenario: &EnrichmentScenario) {
    let organization = organization(enrichment_scenario);
    organization.mount_threads(
        "r1",
        42,
        ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })),
    );
    organization.mount_avatars(AVATAR_PAYLOAD);
}

// --- When steps ---

#[when("the visible pull requests are enriched")]
fn enrich_once(enrichment_scenario: &EnrichmentScenario) {
    enrich(enrichment_scenario, 1);
}

#[when("the visible pull requests are enriched by {count:usize} coordinators sharing one cache")]
fn enrich_with_shared_cache(enrichment_scenario: &EnrichmentScenario, count: usize) {
    enrich(enrichment_scenario, count);
}

// --- Then steps ---

#[then("pull request {id:u64} shows {text}")]
fn assert_comment_cell(enrichment_scenario: &EnrichmentScenario, id: u64, text: String) {
    let counts = state(enrichment_scenario).thread_counts(id);
    assert_eq!(comment_cell(counts), text.trim_matches('"'));
}

#[then("pull request {id:u64} has the tooltip {text}")]
fn assert_comment_tooltip(enrichment_scenario: &EnrichmentScenario, id: u64, text: String) {
    let counts = state(enrichment_scenario).thread_counts(id);
    assert_eq!(comment_tooltip(counts), text.trim_matches('"'));
}

#[then("the creator avatar is loaded")]
fn assert_avatar_loaded(enrichment_scenario: &EnrichmentScenario) {
    let descriptor = AvatarDescriptor::new("aad.a")
        .unwrap_or_else(|| panic!("descriptor should be valid"));
    let loaded = state(enrichment_scenario)
        .avatar(&descriptor)
        .flatten()
        .map(|avatar| avatar.data_uri.clone());
    assert_eq!(
        loaded,
        Some(format!("data:image/png;base64,{AVATAR_PAYLOAD}"))
    );
}

#[then("the thread endpoint was requested {count:usize} times")]
fn assert_thread_requests(enrichment_scenario: &EnrichmentScenario, count: usize) {
    let requests = organization(enrichment_scenario).requests_to(&threads_path("r1", 42));
    assert_eq!(requests, count);
}

#[scenario(path = "tests/features/comment_enrichment.feature", index = 0)]
fn comment_counts_aggregate(enrichment_scenario: EnrichmentScenario) {
    let _ = enrichment_scenario;
}

#[scenario(path = "tests/features/comment_enrichment.feature", index = 1)]
fn uncounted_threads_are_ignored(enrichment_scenario: EnrichmentScenario) {
    let _ = enrichment_scenario;
}

#[scenario(path = "tests/features/comment_enrichment.feature", index = 2)]
fn failing_threads_degrade(enrichment_scenario: EnrichmentScenario) {
    let _ = enrichment_scenario;
}

#[scenario(path = "tests/features/comment_enrichment.feature", index = 3)]
fn second_coordinator_reuses_cache(enrichment_scenario: EnrichmentScenario) {
    let _ = enrichment_scenario;
}
