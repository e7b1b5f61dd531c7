//! Integration test suite for wsexec.
//!
//! These tests run real `sh` processes inside temporary workspaces and
//! check ordering, failure handling and the per-project environment end
//! to end.
//!
//! # Test Categories
//!
//! - `recursive_exec`: Library-level runs against real processes
//! - `cli`: The `wsexec` binary, including the summary file

mod fixtures;

mod cli;
mod recursive_exec;
