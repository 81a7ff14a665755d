//! Tool configuration management.
//!
//! Configuration comes from CLI arguments with environment variable
//! fallbacks for the archive and index paths:
//! - `--archive` / `IMG_TOOL_ARCHIVE`
//! - `--dir` / `IMG_TOOL_DIR`
//!
//! # Example
//!
//! ```no_run
//! use img_tool::ToolConfig;
//!
//! let config = ToolConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Archive: {}", config.archive.display());
//! println!("Index: {}", config.index_path().display());
//! ```

use crate::error::ConfigError;
use clap::{ArgAction, Parser, Subcommand};
use img_archive::{AccessMode, ArchiveOptions};
use std::path::PathBuf;

/// Tool configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "img-tool",
    about = "Inspect and edit IMG game asset archives",
    version
)]
pub struct ToolConfig {
    /// Archive file (.img)
    #[arg(long, short = 'a', env = "IMG_TOOL_ARCHIVE")]
    pub archive: PathBuf,

    /// Index file for split archives (defaults to the .dir next to the archive)
    #[arg(long, short = 'd', env = "IMG_TOOL_DIR")]
    pub dir: Option<PathBuf>,

    /// Open the archive without allowing modifications
    #[arg(long, global = true)]
    pub read_only: bool,

    /// Reject malformed headers instead of reading what is recoverable
    #[arg(long, global = true)]
    pub strict: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create a new empty archive
    Create {
        /// Create a VER1 archive with a separate .dir index
        #[arg(long)]
        split: bool,

        /// Overwrite an existing archive
        #[arg(long)]
        force: bool,
    },

    /// Show archive summary
    Info,

    /// List entries
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,

        /// Only list entries whose name contains this text
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },

    /// Write entry payloads to a directory
    Extract {
        /// Destination directory
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,

        /// Only extract entries whose name contains this text
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },

    /// Import files or directories
    Add {
        /// Files or directories to import
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Overwrite entries that already exist
        #[arg(long)]
        replace: bool,
    },

    /// Remove entries by name
    Remove {
        /// Entry names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Rename an entry
    Rename {
        /// Current entry name
        old: String,
        /// New entry name
        new: String,
    },

    /// Compact payloads and drop unused space
    Pack,
}

impl Command {
    /// Command name as typed on the command line
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Info => "info",
            Self::List { .. } => "list",
            Self::Extract { .. } => "extract",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Rename { .. } => "rename",
            Self::Pack => "pack",
        }
    }

    /// Whether the command writes to the archive
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Create { .. }
                | Self::Add { .. }
                | Self::Remove { .. }
                | Self::Rename { .. }
                | Self::Pack
        )
    }
}

impl ToolConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Index path for split archives.
    ///
    /// Falls back to the archive path with a `.dir` extension.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| self.archive.with_extension("dir"))
    }

    /// Options used when parsing the archive
    #[must_use]
    pub fn archive_options(&self) -> ArchiveOptions {
        let mode = if self.read_only || !self.command.is_mutating() {
            AccessMode::ReadOnly
        } else {
            AccessMode::ReadWrite
        };
        ArchiveOptions::new().mode(mode).strict(self.strict)
    }

    /// Default log filter for the requested verbosity
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - A mutating command is combined with `--read-only`
    /// - `create` would overwrite an existing archive without `--force`
    /// - The archive or an explicit index file doesn't exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_only && self.command.is_mutating() {
            return Err(ConfigError::ReadOnlyCommand(self.command.name()));
        }

        if let Command::Create { force, .. } = self.command {
            if self.archive.exists() && !force {
                return Err(ConfigError::ArchiveExists(self.archive.clone()));
            }
            return Ok(());
        }

        if !self.archive.exists() {
            return Err(ConfigError::ArchiveNotFound(self.archive.clone()));
        }
        if let Some(dir) = &self.dir
            && !dir.exists()
        {
            return Err(ConfigError::IndexNotFound(dir.clone()));
        }

        Ok(())
    }
}
