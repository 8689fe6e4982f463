//! Local file selection.
//!
//! Turns paths picked by the user into [`FileDescriptor`]s. A selected
//! directory contributes every file beneath it, each path starting with the
//! directory's own name; a selected file contributes just its file name.
//! Bytes are not read here, only when the archive is assembled.

use crate::error::{Error, Result};
use crate::types::{FileDescriptor, FileSource};
use std::io;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Describe one selected file or directory.
pub fn select(path: &Path) -> Result<Vec<FileDescriptor>> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::io(path, e))?;

    if metadata.is_file() {
        let name = display_name(path)?;
        return Ok(vec![FileDescriptor::new(
            name,
            FileSource::Disk(path.to_path_buf()),
        )]);
    }

    let root_name = display_name(path)?;
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::io(path, io::Error::from(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(path)
            .map_err(|e| Error::io(entry.path(), io::Error::other(e)))?;
        files.push(FileDescriptor::new(
            format!("{root_name}/{}", slash_path(relative)),
            FileSource::Disk(entry.path().to_path_buf()),
        ));
    }

    log::debug!("Selected {} files from {}", files.len(), path.display());
    Ok(files)
}

/// Describe several selections, in order.
pub fn select_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<FileDescriptor>> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(select(path.as_ref())?);
    }
    Ok(files)
}

/// Last component of `path`, resolving `.` and `..` to a real name.
fn display_name(path: &Path) -> Result<String> {
    let named = match path.components().next_back() {
        Some(Component::Normal(name)) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    };
    if let Some(name) = named {
        return Ok(name);
    }

    let canonical = path.canonicalize().map_err(|e| Error::io(path, e))?;
    Ok(canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string()))
}

/// Join the components of a relative path with `/`.
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
