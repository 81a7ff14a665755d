//! img-tool binary entry point.
//!
//! This is a thin wrapper around the img-tool library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Validates configuration
//! 4. Runs the command
//!
//! Logs go to stderr so command output on stdout stays pipeable.

use anyhow::Result;
use img_tool::{ToolConfig, run};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = ToolConfig::from_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(
        "Configuration loaded: archive={:?}, command={}",
        config.archive,
        config.command.name()
    );

    config.validate()?;
    run(&config, &mut std::io::stdout().lock())?;

    Ok(())
}
