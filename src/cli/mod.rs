//! CLI command handlers
//!
//! Each subcommand is implemented in its own module.

pub mod analyze;
pub mod config;
pub mod parse_price;
pub mod receipt;
pub mod serve;
