//! # CLI Module
//!
//! Command-line interface for the `chainrouter` demo binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! chainrouter serve --addr 127.0.0.1:8080 --config chainrouter.toml
//! ```
//!
//! Serves a small demo route table until Ctrl-C. Configuration comes from
//! the optional TOML file, then `CHAINR_*` environment variables, then
//! `--addr`.
//!
//! ### `routes`
//!
//! ```bash
//! chainrouter routes
//! ```
//!
//! Prints the demo route table in registration order.

mod commands;


pub use commands::{demo_engine, run_cli, Cli, Commands};
