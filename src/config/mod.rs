//! Service Configuration Module
//!
//! ## Loading Order
//!
//! 1. `HANDOVER_CONFIG` environment variable (path to TOML file)
//! 2. `handover.toml` in the current working directory
//! 3. Built-in defaults
//!
//! CLI flags passed to the binary override the loaded values.

mod handover_config;

pub use handover_config::*;
