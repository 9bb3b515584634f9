//! Integration tests for snapmark
//!
//! These tests verify that capture, storage and replay work together.

#[path = "../common/mod.rs"]
pub mod common;

pub mod bookmark_flow;
pub mod replay_flow;
