//! Pullboard library crate: an active pull request dashboard for Azure
//! DevOps projects.
//!
//! The library lists the active pull requests of a project through the REST
//! API, filters them by repository, creator, reviewer and draft status,
//! persists each user's filter selection, and enriches the visible rows with
//! comment resolution counts and contributor avatars fetched by a bounded
//! worker pool.

pub mod azure;
pub mod config;
pub mod persistence;
pub mod pipeline;
pub mod telemetry;

pub use azure::{
    AzureDevOpsGateway, IntakeError, ProjectIntake, ProjectSnapshot, PullRequestSummary,
};
pub use config::PullboardConfig;
pub use pipeline::{EnrichmentCoordinator, FilterController, FilterSelection};
