//! CLI module - terminal channel
//!
//! Contains the REPL and command parsing.

pub mod commands;
pub mod repl;

pub use repl::{Repl, TerminalOutput};
