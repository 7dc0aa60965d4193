//! Shared test utilities for pdbsearch integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. The stub transport is synchronous and deterministic;
//! the fake search API runs a real HTTP server on its own runtime so the
//! blocking transport can be exercised from plain `#[test]` functions.

#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod fake_search_api;
pub mod fixtures;
pub mod stub_transport;

pub use builders::*;
pub use fixtures::*;
pub use stub_transport::*;
