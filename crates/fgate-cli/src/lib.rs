//! # fgate-cli
//!
//! Library half of the `fgate` binary: the typed API client and the
//! subcommand handlers, kept here so they can be tested without a process.

pub mod client;
pub mod commands;
