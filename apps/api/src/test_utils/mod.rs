//! Test utilities for integration testing.
//!
//! This module provides:
//! - Fixed key material and settings for deterministic signing
//! - An in-memory identity provider standing in for the upstream service
//! - `TestAppStateBuilder` for HTTP-level tests against the real router

mod app_state_builder;
mod factories;
mod identity_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use identity_mocks::*;
