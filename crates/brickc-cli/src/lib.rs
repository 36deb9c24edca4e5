//! # brickc CLI library
//!
//! Command definitions for the `brickc` binary: build, clean, test, rules,
//! validate and info.

pub mod commands;

pub use commands::*;
