//! Re-resolution of persisted filter selections against current entities.
//!
//! Persisted selections are snapshots of whole entities taken when the user
//! last changed a filter. Only their `id` fields are trusted: each id is
//! looked up among the entities loaded now and unknown ids are dropped.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::azure::models::{IdentityRef, RepositoryRef};

use super::filter::{FilterSelection, OtherFlag};
use super::options::FilterOptions;

/// Raw persisted values, one per filter dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedSelection {
    /// Stored repository snapshots.
    pub repositories: Option<Value>,
    /// Stored creator snapshots.
    pub creators: Option<Value>,
    /// Stored reviewer snapshots.
    pub reviewers: Option<Value>,
    /// Stored flag keys.
    pub other: Option<Value>,
}

/// Selected entities per dimension, holding current instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedEntities {
    /// Selected repositories.
    pub repositories: Vec<RepositoryRef>,
    /// Selected creators.
    pub creators: Vec<IdentityRef>,
    /// Selected reviewers.
    pub reviewers: Vec<IdentityRef>,
    /// Selected flags.
    pub other: Vec<OtherFlag>,
}

impl SelectedEntities {
    /// Identifier sets consumed by the filter engine.
    #[must_use]
    pub fn selection(&self) -> FilterSelection {
        FilterSelection {
            repositories: self.repositories.iter().map(|repo| repo.id.clone()).collect(),
            creators: self.creators.iter().map(|user| user.id.clone()).collect(),
            reviewers: self.reviewers.iter().map(|user| user.id.clone()).collect(),
            other: self.other.iter().copied().collect(),
        }
    }
}

/// Filter-item state envelope stored under each preference key.
#[derive(Debug, Serialize)]
struct FilterItemState<'a, T: Serialize> {
    value: &'a [T],
}

/// Serialises a dimension in the persisted `{ "value": [...] }` shape.
///
/// # Errors
///
/// Returns the serialisation error when an entity cannot be encoded.
pub fn snapshot<T: Serialize>(entities: &[T]) -> Result<Value, serde_json::Error> {
    serde_json::to_value(FilterItemState { value: entities })
}

/// Resolves `persisted` against the entities offered in `options`.
///
/// Snapshot entries without an `id`, and ids that no longer exist, are
/// dropped silently. Unknown flag keys are dropped too. Both the
/// `{ "value": [...] }` envelope and a bare array are accepted.
#[must_use]
pub fn normalize_selection(
    persisted: &PersistedSelection,
    options: &FilterOptions,
) -> SelectedEntities {
    SelectedEntities {
        repositories: resolve(
            persisted.repositories.as_ref(),
            &options.repositories,
            |repo| &repo.id,
        ),
        creators: resolve(persisted.creators.as_ref(), &options.creators, |user| {
            &user.id
        }),
        reviewers: resolve(persisted.reviewers.as_ref(), &options.reviewers, |user| {
            &user.id
        }),
        other: entries(persisted.other.as_ref())
            .iter()
            .filter_map(Value::as_str)
            .filter_map(OtherFlag::from_key)
            .collect(),
    }
}

fn entries(value: Option<&Value>) -> &[Value] {
    let list = match value {
        Some(Value::Object(map)) => map.get("value"),
        other => other,
    };
    list.and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn snapshot_ids(value: Option<&Value>) -> Vec<&str> {
    entries(value)
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .collect()
}

fn resolve<T: Clone>(
    persisted: Option<&Value>,
    current: &[T],
    id_of: impl Fn(&T) -> &String,
) -> Vec<T> {
    let by_id: HashMap<&str, &T> = current
        .iter()
        .map(|entity| (id_of(entity).as_str(), entity))
        .collect();
    let mut resolved: Vec<T> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for id in snapshot_ids(persisted) {
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        if let Some(entity) = by_id.get(id) {
            resolved.push((*entity).clone());
        }
    }
    resolved
}
