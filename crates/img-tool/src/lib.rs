//! Command-line tool for IMG game asset archives.
//!
//! This crate wraps [`img_archive`] with file handling and a small set of
//! commands:
//! - `create`: new unified (VER2) or split (VER1 + `.dir`) archive
//! - `info` and `list`: inspect the table, optionally as JSON
//! - `extract`: write payloads to a directory
//! - `add`, `remove`, `rename`: edit entries
//! - `pack`: compact payloads and drop unused space
//!
//! # Example
//!
//! ```no_run
//! use img_tool::{ToolConfig, run};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ToolConfig::from_args();
//!     config.validate()?;
//!     run(&config, &mut std::io::stdout().lock())?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod commands;
pub mod config;
pub mod error;
pub mod io;

pub use commands::run;
pub use config::{Command, ToolConfig};
pub use error::{ConfigError, ToolError, ToolResult};
pub use io::{load_archive, save_archive};
