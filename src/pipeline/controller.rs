//! Owner of the active filter selection.
//!
//! [`FilterController`] holds the selected entities, announces every change
//! to its subscribers and writes each known dimension through to a
//! [`PreferenceStore`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::azure::models::{IdentityRef, PullRequestSummary, RepositoryRef};
use crate::persistence::{PersistenceError, PreferenceKey, PreferenceStore, UserScope};

use super::filter::{FilterSelection, OtherFlag, filter};
use super::normalize::{PersistedSelection, SelectedEntities, normalize_selection, snapshot};
use super::notify::Notifier;
use super::options::FilterOptions;

/// A change to one or all filter dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// Replaces the selected repositories.
    Repositories(Vec<RepositoryRef>),
    /// Replaces the selected creators.
    Creators(Vec<IdentityRef>),
    /// Replaces the selected reviewers.
    Reviewers(Vec<IdentityRef>),
    /// Replaces the selected flags.
    Other(Vec<OtherFlag>),
    /// Clears every dimension.
    Clear,
}

impl FilterChange {
    const fn keys(&self) -> &'static [PreferenceKey] {
        match self {
            Self::Repositories(_) => &[PreferenceKey::Repositories],
            Self::Creators(_) => &[PreferenceKey::CreatedBy],
            Self::Reviewers(_) => &[PreferenceKey::Reviewers],
            Self::Other(_) => &[PreferenceKey::Other],
            Self::Clear => &PreferenceKey::ALL,
        }
    }

    fn apply_to(self, selected: &mut SelectedEntities) {
        match self {
            Self::Repositories(repositories) => selected.repositories = repositories,
            Self::Creators(creators) => selected.creators = creators,
            Self::Reviewers(reviewers) => selected.reviewers = reviewers,
            Self::Other(other) => selected.other = other,
            Self::Clear => *selected = SelectedEntities::default(),
        }
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    selected: SelectedEntities,
    known: HashSet<PreferenceKey>,
}

/// Single owner of the filter selection for one user scope.
pub struct FilterController {
    store: Arc<dyn PreferenceStore>,
    scope: UserScope,
    state: Mutex<ControllerState>,
    changes: Notifier<FilterSelection>,
}

impl FilterController {
    /// Creates a controller with nothing selected and no dimension known.
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>, scope: UserScope) -> Self {
        Self {
            store,
            scope,
            state: Mutex::new(ControllerState::default()),
            changes: Notifier::new(),
        }
    }

    /// Notifier announcing each new selection.
    #[must_use]
    pub const fn changes(&self) -> &Notifier<FilterSelection> {
        &self.changes
    }

    /// Currently selected entities.
    #[must_use]
    pub fn selected(&self) -> SelectedEntities {
        self.lock().selected.clone()
    }

    /// Identifier sets for the filter engine.
    #[must_use]
    pub fn selection(&self) -> FilterSelection {
        self.lock().selected.selection()
    }

    /// Applies the current selection to `all`.
    #[must_use]
    pub fn visible(&self, all: &[PullRequestSummary]) -> Vec<PullRequestSummary> {
        filter(all, &self.selection())
    }

    /// Loads the stored selection, resolves it against `options` and
    /// announces the result.
    ///
    /// A key that cannot be read is logged and treated as unset; every
    /// dimension becomes known either way.
    pub async fn restore(&self, options: &FilterOptions) -> FilterSelection {
        let persisted = PersistedSelection {
            repositories: self.load(PreferenceKey::Repositories).await,
            creators: self.load(PreferenceKey::CreatedBy).await,
            reviewers: self.load(PreferenceKey::Reviewers).await,
            other: self.load(PreferenceKey::Other).await,
        };
        let selected = normalize_selection(&persisted, options);
        let selection = selected.selection();
        {
            let mut state = self.lock();
            state.selected = selected;
            state.known.extend(PreferenceKey::ALL);
        }
        self.changes.emit(&selection);
        selection
    }

    /// Applies `change`, announces the new selection and writes every known
    /// dimension through to the store.
    ///
    /// # Errors
    ///
    /// Returns the first store error. The in-memory selection and the
    /// announcement are not rolled back.
    pub async fn apply(&self, change: FilterChange) -> Result<FilterSelection, PersistenceError> {
        let (selection, writes) = {
            let mut state = self.lock();
            state.known.extend(change.keys().iter().copied());
            change.apply_to(&mut state.selected);
            (state.selected.selection(), pending_writes(&state)?)
        };
        self.changes.emit(&selection);

        for (key, value) in writes {
            self.store.set_value(key, &value, &self.scope).await?;
        }
        Ok(selection)
    }

    async fn load(&self, key: PreferenceKey) -> Option<Value> {
        match self.store.get_value(key, &self.scope).await {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!("could not read preference {key}: {error}");
                None
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for FilterController {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FilterController")
            .field("scope", &self.scope)
            .field("changes", &self.changes)
            .finish_non_exhaustive()
    }
}

fn pending_writes(state: &ControllerState) -> Result<Vec<(PreferenceKey, Value)>, PersistenceError> {
    let selected = &state.selected;
    PreferenceKey::ALL
        .into_iter()
        .filter(|key| state.known.contains(key))
        .map(|key| {
            let value = match key {
                PreferenceKey::Repositories => snapshot(&selected.repositories),
                PreferenceKey::CreatedBy => snapshot(&selected.creators),
                PreferenceKey::Reviewers => snapshot(&selected.reviewers),
                PreferenceKey::Other => snapshot(&selected.other),
            };
            value
                .map(|encoded| (key, encoded))
                .map_err(|error| PersistenceError::InvalidValue {
                    message: format!("{key}: {error}"),
                })
        })
        .collect()
}
