//! Command-line interface for vetbox.

pub mod args;
pub mod commands;
