//! Loading and saving archives on disk.
//!
//! Unified archives live in a single `.img` file. Split archives pair the
//! `.img` data file with a `.dir` index, found next to the archive unless an
//! explicit index path is configured.

use crate::config::ToolConfig;
use crate::error::{ToolError, ToolResult};
use img_archive::{Archive, Layout};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Read a file, attaching the path to any I/O error
pub fn read_file(path: &Path) -> ToolResult<Vec<u8>> {
    fs::read(path).map_err(|source| ToolError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a file, creating parent directories as needed
pub fn write_file(path: &Path, bytes: &[u8]) -> ToolResult<()> {
    let wrap = |source| ToolError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, bytes).map_err(wrap)
}

/// Open the configured archive.
///
/// The layout is detected from the data file. Split archives read their
/// index from [`ToolConfig::index_path`]; a missing sibling index is treated
/// as an empty table.
///
/// # Errors
///
/// Returns an error if a file cannot be read or the archive fails to parse.
pub fn load_archive(config: &ToolConfig) -> ToolResult<Archive> {
    let data = read_file(&config.archive)?;
    let layout = Layout::guess(&data);

    let index = match layout {
        Layout::Unified => None,
        Layout::Split => {
            let index_path = config.index_path();
            if index_path.exists() {
                Some(read_file(&index_path)?)
            } else {
                warn!(
                    "No index file at {}, treating archive as empty",
                    index_path.display()
                );
                None
            }
        }
    };

    let archive = Archive::parse_with_options(data, index, config.archive_options())?;
    info!(
        "Opened {} ({}, {} entries)",
        config.archive.display(),
        archive.layout(),
        archive.len()
    );
    Ok(archive)
}

/// Sync the archive and write its buffers back to disk.
///
/// # Errors
///
/// Returns an error if syncing fails or a file cannot be written.
pub fn save_archive(config: &ToolConfig, archive: &mut Archive) -> ToolResult<()> {
    archive.sync()?;

    write_file(&config.archive, archive.data())?;
    debug!(
        "Wrote {} bytes to {}",
        archive.data().len(),
        config.archive.display()
    );

    if let Some(index) = archive.index_data() {
        let index_path = config.index_path();
        write_file(&index_path, index)?;
        debug!("Wrote {} bytes to {}", index.len(), index_path.display());
    }

    Ok(())
}
