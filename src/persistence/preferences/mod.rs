//! Per-user key-value storage for filter preferences.
//!
//! Values are JSON documents stored under one of the [`PreferenceKey`]s and
//! scoped to a [`UserScope`], so several users can share one database.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::PersistenceError;

mod sqlite;

pub use sqlite::SqlitePreferenceStore;

/// Keys under which filter selections are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    /// Selected repositories.
    Repositories,
    /// Selected creators.
    CreatedBy,
    /// Selected reviewers.
    Reviewers,
    /// Selected flags.
    Other,
}

impl PreferenceKey {
    /// Every key in write order.
    pub const ALL: [Self; 4] = [
        Self::Repositories,
        Self::CreatedBy,
        Self::Reviewers,
        Self::Other,
    ];

    /// Stored key name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repositories => "userRepositoriesKey",
            Self::CreatedBy => "userCreatedByKey",
            Self::Reviewers => "userReviewersKey",
            Self::Other => "userOtherKey",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Owner of a set of stored preferences, usually the signed-in user's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserScope(String);

impl UserScope {
    /// Scope used when no user is known.
    pub const DEFAULT: &'static str = "default";

    /// Wraps `value`, falling back to [`Self::DEFAULT`] when blank.
    #[must_use]
    pub fn new(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self(Self::DEFAULT.to_owned())
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Borrow the scope value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Storage for preference values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get_value(
        &self,
        key: PreferenceKey,
        scope: &UserScope,
    ) -> Result<Option<Value>, PersistenceError>;

    /// Stores `value` under `key`, replacing any earlier value.
    async fn set_value(
        &self,
        key: PreferenceKey,
        value: &Value,
        scope: &UserScope,
    ) -> Result<(), PersistenceError>;
}

/// Preference store that lives for the process only.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: Mutex<HashMap<(UserScope, PreferenceKey), Value>>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get_value(
        &self,
        key: PreferenceKey,
        scope: &UserScope,
    ) -> Result<Option<Value>, PersistenceError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(scope.clone(), key))
            .cloned())
    }

    async fn set_value(
        &self,
        key: PreferenceKey,
        value: &Value,
        scope: &UserScope,
    ) -> Result<(), PersistenceError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((scope.clone(), key), value.clone());
        Ok(())
    }
}
