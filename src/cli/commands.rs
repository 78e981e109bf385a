use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::DispatcherConfig;
use crate::dispatcher::Dispatcher;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::registry::Catalog;
use crate::server::HttpServer;

/// Command-line interface for brrtdispatch.
#[derive(Debug, Parser)]
#[command(name = "brrtdispatch", version)]
#[command(about = "HTTP dispatch pipeline runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve HTTP requests through a configured dispatcher
    Serve {
        /// Dispatcher config file (YAML or JSON)
        #[arg(short, long, env = "BRRTD_CONFIG")]
        config: PathBuf,

        /// Listen address
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        addr: String,
    },
    /// Show the endpoint each path resolves to
    Resolve {
        #[arg(short, long, env = "BRRTD_CONFIG")]
        config: PathBuf,

        /// Request paths to resolve
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Validate a config by booting a dispatcher from it
    Check {
        #[arg(short, long, env = "BRRTD_CONFIG")]
        config: PathBuf,
    },
}

/// Parse arguments, install logging and run the selected command.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env())?;
    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

/// Run a parsed command, writing command output to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { config, addr } => {
            let dispatcher = Arc::new(boot(&config)?);
            let server = HttpServer::bind(addr.as_str())
                .with_context(|| format!("failed to bind {addr}"))?;
            writeln!(out, "listening on http://{}", server.local_addr())?;
            out.flush()?;
            server.serve(&dispatcher);
            Ok(())
        }
        Commands::Resolve { config, paths } => {
            let dispatcher = boot(&config)?;
            let registry = dispatcher.registry();
            for path in &paths {
                match registry.resolve(path) {
                    Some(resolved) => writeln!(out, "{path} -> {}", resolved.matched_path)?,
                    None => writeln!(out, "{path} -> <none>")?,
                }
            }
            Ok(())
        }
        Commands::Check { config } => {
            let dispatcher = boot(&config)?;
            let registry = dispatcher.registry();
            writeln!(out, "config ok: {} endpoint(s)", registry.len())?;
            for path in registry.paths() {
                writeln!(out, "  {path}")?;
            }
            Ok(())
        }
    }
}

fn boot(config_path: &Path) -> anyhow::Result<Dispatcher> {
    let config = DispatcherConfig::load(config_path)?;
    let dispatcher = Dispatcher::from_config(&config, &Catalog::with_builtins())
        .with_context(|| format!("failed to assemble dispatcher from {}", config_path.display()))?;
    dispatcher.start()?;
    info!(config = %config_path.display(), "Dispatcher ready");
    Ok(dispatcher)
}
