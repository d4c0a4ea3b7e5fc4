//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the coroutine runtime, read once at
//! startup.
//!
//! ## Environment Variables
//!
//! ### `MINIHTTPD_STACK_SIZE`
//!
//! Stack size for connection coroutines. Accepts values in:
//! - Decimal: `32768` (32 KB)
//! - Hexadecimal: `0x8000` (32 KB)
//!
//! Default: `0x10000` (64 KB)
//!
//! Each accepted connection gets its own coroutine, so total virtual memory is
//! roughly `stack_size × open connections`. Handlers here are shallow; the
//! default leaves headroom for `tracing` formatting and filesystem calls.
//!
//! ```bash
//! export MINIHTTPD_STACK_SIZE=0x10000
//! minihttpd --directory /srv/files
//! ```

use std::env;

/// Stack size used when `MINIHTTPD_STACK_SIZE` is unset or unparsable.
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 64 KB / 0x10000)
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("MINIHTTPD_STACK_SIZE")
            .ok()
            .and_then(|v| parse_stack_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal byte count.
fn parse_stack_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
