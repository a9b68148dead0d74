//! Command implementations for the dv CLI
//!
//! Each command module handles the CLI interface and delegates to
//! dv-core for the actual work.

pub mod resolve;
