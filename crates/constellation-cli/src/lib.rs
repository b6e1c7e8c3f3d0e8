//! Constellation CLI library.
//!
//! Exposes the argument definitions and command handlers so they can be
//! tested without spawning the binary.

pub mod cli;
pub mod commands;
