//! Command implementations.
//!
//! Each command loads the archive, does its work and, for mutating commands,
//! syncs and writes the result back. Human-readable output goes to the
//! supplied writer; diagnostics go through `tracing`.

use crate::config::{Command, ToolConfig};
use crate::error::{ToolError, ToolResult};
use crate::io::{load_archive, read_file, save_archive, write_file};
use img_archive::{Archive, Entry, Layout};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Run the configured command, writing its output to `out`.
///
/// # Errors
///
/// Returns an error if the archive cannot be loaded, the operation fails or
/// the result cannot be written.
pub fn run(config: &ToolConfig, out: &mut dyn Write) -> ToolResult<()> {
    match &config.command {
        Command::Create { split, .. } => create(config, *split, out),
        Command::Info => {
            let archive = load_archive(config)?;
            info_command(config, &archive, out)
        }
        Command::List { json, filter } => {
            let archive = load_archive(config)?;
            list(&archive, *json, filter.as_deref(), out)
        }
        Command::Extract { output, filter } => {
            let archive = load_archive(config)?;
            extract(&archive, output, filter.as_deref(), out)
        }
        Command::Add { paths, replace } => {
            let mut archive = load_archive(config)?;
            add(&mut archive, paths, *replace, out)?;
            save_archive(config, &mut archive)
        }
        Command::Remove { names } => {
            let mut archive = load_archive(config)?;
            remove(&mut archive, names, out)?;
            save_archive(config, &mut archive)
        }
        Command::Rename { old, new } => {
            let mut archive = load_archive(config)?;
            archive.rename(old, new)?;
            writeln!(out, "Renamed {old} -> {new}")?;
            save_archive(config, &mut archive)
        }
        Command::Pack => {
            let mut archive = load_archive(config)?;
            let reclaimed = archive.wasted_bytes();
            let blocks = archive.pack()?;
            writeln!(out, "Packed to {blocks} blocks, reclaimed {reclaimed} bytes")?;
            save_archive(config, &mut archive)
        }
    }
}

fn create(config: &ToolConfig, split: bool, out: &mut dyn Write) -> ToolResult<()> {
    let layout = if split { Layout::Split } else { Layout::Unified };
    let mut archive = Archive::create(layout);
    save_archive(config, &mut archive)?;
    info!("Created {} archive {}", layout, config.archive.display());
    writeln!(out, "Created {} ({layout})", config.archive.display())?;
    Ok(())
}

fn info_command(config: &ToolConfig, archive: &Archive, out: &mut dyn Write) -> ToolResult<()> {
    let kind = match archive.layout() {
        Layout::Unified => "unified",
        Layout::Split => "split",
    };
    writeln!(out, "Archive: {}", config.archive.display())?;
    if archive.layout() == Layout::Split {
        writeln!(out, "Index: {}", config.index_path().display())?;
    }
    writeln!(out, "Version: {} ({kind})", archive.layout())?;
    writeln!(out, "Entries: {}", archive.len())?;
    writeln!(out, "Header blocks: {}", archive.header_reserved_blocks())?;
    writeln!(out, "Total blocks: {}", archive.total_blocks())?;
    writeln!(out, "Unused bytes: {}", archive.wasted_bytes())?;
    Ok(())
}

fn selected<'a>(archive: &'a Archive, filter: Option<&str>) -> Vec<&'a Entry> {
    match filter {
        Some(pattern) => archive.find(pattern).collect(),
        None => archive.entries().iter().collect(),
    }
}

fn list(archive: &Archive, json: bool, filter: Option<&str>, out: &mut dyn Write) -> ToolResult<()> {
    let entries = selected(archive, filter);
    if json {
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
    } else {
        for entry in entries {
            writeln!(out, "{entry}")?;
        }
    }
    Ok(())
}

/// Whether an entry name stays inside the output directory when used as a file name
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
}

fn extract(
    archive: &Archive,
    output: &Path,
    filter: Option<&str>,
    out: &mut dyn Write,
) -> ToolResult<()> {
    let mut written = 0usize;
    for entry in selected(archive, filter) {
        if !is_safe_file_name(entry.name()) {
            warn!("Skipping entry with unsafe name: {:?}", entry.name());
            continue;
        }
        let payload = archive.read_payload(entry)?;
        let target = output.join(entry.name());
        write_file(&target, payload)?;
        debug!("Extracted {} ({} bytes)", entry.name(), payload.len());
        written += 1;
    }
    writeln!(out, "Extracted {written} entries to {}", output.display())?;
    Ok(())
}

/// Expand files and directories into the list of files to import
fn collect_inputs(paths: &[PathBuf]) -> ToolResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        for item in WalkDir::new(path).sort_by_file_name() {
            let item = item.map_err(|source| ToolError::WalkFailed {
                path: path.clone(),
                source,
            })?;
            if item.file_type().is_file() {
                files.push(item.into_path());
            }
        }
    }
    Ok(files)
}

fn add(archive: &mut Archive, paths: &[PathBuf], replace: bool, out: &mut dyn Write) -> ToolResult<()> {
    for path in collect_inputs(paths)? {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ToolError::UnnamedInput(path.clone()))?;
        let data = read_file(&path)?;

        let entry = if replace {
            archive.add_or_replace(name, &data)?
        } else {
            archive.add(name, &data)?
        };
        writeln!(out, "Added {entry}")?;
    }
    Ok(())
}

fn remove(archive: &mut Archive, names: &[String], out: &mut dyn Write) -> ToolResult<()> {
    for name in names {
        if archive.remove(name)? {
            writeln!(out, "Removed {name}")?;
        } else {
            warn!("Entry not found: {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_names() {
        assert!(is_safe_file_name("infernus.dff"));
        assert!(is_safe_file_name("..hidden"));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name("models/infernus.dff"));
        assert!(!is_safe_file_name("..\\boot.ini"));
        assert!(!is_safe_file_name("c:boot"));
    }

    #[test]
    fn test_list_filters_case_insensitively() {
        let mut archive = Archive::create(Layout::Unified);
        archive.add("infernus.dff", b"model").unwrap();
        archive.add("infernus.txd", b"texture").unwrap();
        archive.add("handling.cfg", b"cfg").unwrap();

        let mut out = Vec::new();
        list(&archive, false, Some("INFERNUS"), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "infernus.dff (Offset: 1, Size: 1 blocks)\ninfernus.txd (Offset: 2, Size: 1 blocks)\n"
        );
    }

    #[test]
    fn test_list_json_fields() {
        let mut archive = Archive::create(Layout::Unified);
        archive.add("a.dat", &[7u8; 3000]).unwrap();

        let mut out = Vec::new();
        list(&archive, true, None, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["name"], "a.dat");
        assert_eq!(value[0]["offset"], 1);
        assert_eq!(value[0]["size"], 2);
        assert_eq!(value[0]["sizeInBytes"], 4096);
    }

    #[test]
    fn test_remove_reports_missing_without_failing() {
        let mut archive = Archive::create(Layout::Unified);
        archive.add("a.dat", b"a").unwrap();

        let mut out = Vec::new();
        remove(&mut archive, &["b.dat".to_string(), "A.DAT".to_string()], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Removed A.DAT\n");
        assert!(archive.is_empty());
    }
}
