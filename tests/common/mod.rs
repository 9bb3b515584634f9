//! Shared test utilities for snapmark
//!
//! - Pendulum input fixtures
//! - Serializers backed by temporary stores

pub mod fixtures;
