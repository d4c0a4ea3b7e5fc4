use crate::runtime_config::RuntimeConfig;
use crate::server::{HttpServer, ServerConfig};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Command-line interface for minihttpd
#[derive(Parser, Debug)]
#[command(name = "minihttpd")]
#[command(version, about = "Minimal HTTP/1.1 file and echo server", long_about = None)]
pub struct Cli {
    /// Directory served by GET /files/<name> and written by POST /files/<name>
    /// (default: the platform temp directory)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Address and port to bind the server to
    #[arg(long, default_value = "0.0.0.0:4221")]
    pub addr: String,

    /// Close connections that send nothing for this many seconds
    /// (default: wait indefinitely)
    #[arg(long)]
    pub read_timeout_secs: Option<u64>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, env = "MINIHTTPD_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Base directory for the file routes.
    #[must_use]
    pub fn files_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Combine flags with environment-driven runtime settings.
    #[must_use]
    pub fn server_config(&self, runtime: RuntimeConfig) -> ServerConfig {
        ServerConfig {
            files_dir: self.files_dir(),
            read_timeout: self.read_timeout_secs.map(Duration::from_secs),
            stack_size: runtime.stack_size,
        }
    }
}

/// Start the server and block until the listener stops
///
/// # Errors
///
/// Returns an error if:
/// - The address cannot be bound
/// - The listener fails to accept a connection (fatal to the process)
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let runtime = RuntimeConfig::from_env();
    may::config().set_stack_size(runtime.stack_size);

    let config = cli.server_config(runtime);
    info!(
        files_dir = %config.files_dir.display(),
        stack_size = config.stack_size,
        "Server configuration loaded"
    );

    let handle = HttpServer::new(config)
        .start(cli.addr.as_str())
        .with_context(|| format!("Failed to bind to {}", cli.addr))?;

    handle.join().context("Listener stopped")?;
    Ok(())
}
