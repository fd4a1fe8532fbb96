//! Command-line front-end for the ktc checks.
//!
//! The analysis itself lives in the `ktc-*` crates; this package loads
//! `ktc.json` project files, parses arguments, runs units in parallel and
//! renders diagnostics.

pub mod cli;
pub mod tracing_config;
