//! SurfPilot command-line front end.
//!
//! Wires configuration, logging and a Chromium page factory around the agent loop in
//! `agent-core`. Exposed as a library so the CLI can be exercised from integration tests.

pub mod browser;
pub mod cli;
pub mod config;
