//! Integration test utilities for creator messaging
//!
//! This crate provides helpers for wiring a whole messaging platform,
//! in memory or against PostgreSQL and Redis, and driving it through
//! several signed-in users at once.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
