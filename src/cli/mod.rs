//! CLI operation mode handlers.
//!
//! This module contains the implementations for the operation modes:
//! - [`listing`]: List, filter and enrich the active pull requests of a
//!   project
//! - [`migrations`]: Database schema migrations
//!
//! Output formatting utilities are in [`output`].

pub mod listing;
pub mod migrations;
pub mod output;
