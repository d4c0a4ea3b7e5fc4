//! # CLI Module
//!
//! Command-line surface of the `minihttpd` binary.
//!
//! ```bash
//! minihttpd --directory /srv/files
//! minihttpd --directory /srv/files --addr 127.0.0.1:8080 --read-timeout-secs 30
//! ```
//!
//! Options:
//! - `--directory <DIR>` - Base directory for `/files/` (default: platform temp dir)
//! - `--addr <ADDR>` - Listen address (default: `0.0.0.0:4221`)
//! - `--read-timeout-secs <N>` - Per-connection read deadline (default: none)
//! - `--log-level <LEVEL>` - Overrides `MINIHTTPD_LOG_LEVEL`
//!
//! The base directory and address are read once at startup and never change
//! while the server runs.

mod commands;


pub use commands::{run_cli, Cli};
