//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `cli_flags`: Short command-line flags
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `field_resolution`: Token, organisation, project and selection
//!   resolution tests

mod helpers;
