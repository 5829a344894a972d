//! Built-in tool implementations, one namespace per module

pub mod bundler;
pub mod files;
pub mod git;
pub mod rubocop;
pub mod user_input;
