//! Shared fixtures for the integration test binaries.

#![allow(dead_code)]

pub mod builders;

pub use builders::*;
