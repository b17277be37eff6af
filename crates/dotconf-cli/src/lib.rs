//! dotconf CLI library
//!
//! This module exposes the CLI main function so the binary stays a thin
//! wrapper and the argument handling can be tested.

mod cli;

pub use cli::run;
