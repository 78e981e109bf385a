//! # CLI Module
//!
//! Command-line front end for running and inspecting a dispatcher described
//! by a config file. Names in the config resolve against
//! [`Catalog::with_builtins`](crate::registry::Catalog::with_builtins).
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! brrtdispatch serve --config dispatch.yaml --addr 127.0.0.1:8080
//! ```
//!
//! ### `resolve`
//!
//! Print which endpoint each path resolves to, after the fallback is mounted:
//!
//! ```bash
//! brrtdispatch resolve --config dispatch.yaml /forum/thread/1 /About
//! ```
//!
//! ### `check`
//!
//! Load the config, assemble and start the dispatcher, and list its
//! endpoints in resolution order. Exits non-zero on any boot error.
//!
//! Logging is configured through `BRRTD_LOG_*` (see [`crate::logging`]) and
//! always goes to stderr.

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
