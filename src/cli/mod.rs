//! Command line layer for apprun.
//!
//! This module defines the standard flags every application gets (`args`)
//! and the usage block printed on usage errors (`usage`). The orchestration
//! that ties parsing, logging and dispatch together lives in `runner`.
pub mod args;
pub mod usage;

pub use args::{CommandLine, NoFlags, StandardFlags};
pub use usage::{DEFAULT_USAGE, render_flags, render_usage, write_error};
