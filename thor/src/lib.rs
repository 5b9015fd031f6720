//! `thor` is a small HTTP load generator.
//!
//! It sends a fixed number of GET requests to a single URL from a pool of concurrent workers. Each
//! worker issues its requests one after another and reports the elapsed time of every request as
//! well as its own average. Once all workers are done, the average across all workers is
//! reported.
//!
//! ```text
//! Process: 0, Request: 0, Elapsed Time: 0.12
//! Process: 1, Request: 0, Elapsed Time: 0.13
//! Process: 0, AVERAGE   , Elapsed Time: 0.12
//! Process: 1, AVERAGE   , Elapsed Time: 0.13
//! TOTAL AVERAGE ELAPSED TIME: 0.13
//! ```
//!
//! Any failed request aborts the entire run. No partial average is reported in that case.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod observability;
pub mod report;
pub mod stats;
pub mod worker;

pub use crate::config::Config;
pub use crate::dispatcher::{run, run_with_client};
pub use crate::error::{Error, Result};
