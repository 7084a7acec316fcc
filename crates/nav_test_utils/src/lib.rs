//! # Nav Test Utilities
//!
//! Shared testing utilities for the navigation crates:
//! - Hand-built world snapshots and grids
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
