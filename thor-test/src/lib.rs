//! Test utilities for thor.
//!
//! This crate provides utilities to facilitate testing of thor against a real HTTP endpoint. See
//! the modules for all available utilities.

pub mod server;
pub mod tracing;
