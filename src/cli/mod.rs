//! CLI module for toolbuddy
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, Verbosity};
