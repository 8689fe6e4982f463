//! Core types for flattening.
//!
//! This module contains the data model shared by the traversal, naming,
//! and archive stages: where a tree lives, what a listing returns, and the
//! per-file descriptors that flow into the archive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Branch assumed when a URL carries no `/tree/<branch>` segment.
pub const DEFAULT_BRANCH: &str = "main";

/// Delimiter used to join path segments unless configured otherwise.
pub const DEFAULT_DELIMITER: &str = "))";

/// File name given to the produced archive.
pub const DEFAULT_ARCHIVE_NAME: &str = "flattened_files.zip";

/// Location of a directory (or file) inside a GitHub repository.
///
/// # Example
///
/// ```
/// use flatkit::RepositoryLocation;
///
/// let location = RepositoryLocation::new("rust-lang", "rust", "master", "library/core");
/// assert_eq!(location.to_string(), "rust-lang/rust@master:library/core");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryLocation {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repository: String,
    /// Branch name; [`DEFAULT_BRANCH`] when the URL did not name one.
    pub branch: String,
    /// Path inside the repository, without leading or trailing slashes.
    pub subpath: String,
    /// Whether the branch was named explicitly in the source URL.
    ///
    /// Listings only pin the branch when this is set, so an unnamed branch
    /// resolves to whatever the repository's default branch is.
    #[serde(default)]
    pub branch_explicit: bool,
}

impl RepositoryLocation {
    /// Create a location with an explicitly named branch.
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
        subpath: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            branch: branch.into(),
            subpath: subpath.into(),
            branch_explicit: true,
        }
    }

    /// Same repository and branch, different path.
    #[must_use]
    pub fn with_subpath(&self, subpath: impl Into<String>) -> Self {
        Self {
            subpath: subpath.into(),
            ..self.clone()
        }
    }

    /// The branch to pin in API requests, if any.
    #[must_use]
    pub fn pinned_ref(&self) -> Option<&str> {
        self.branch_explicit.then_some(self.branch.as_str())
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repository, self.branch)?;
        if !self.subpath.is_empty() {
            write!(f, ":{}", self.subpath)?;
        }
        Ok(())
    }
}

/// Kind of an item returned by a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    #[serde(rename = "dir")]
    Directory,
    /// Symbolic link, submodule, or anything else; never traversed.
    #[serde(other)]
    Other,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Item kind.
    pub kind: EntryKind,
    /// Repository-relative path.
    pub path: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Where the raw content can be downloaded (files only).
    pub content_locator: Option<String>,
}

impl RemoteEntry {
    /// Create a file entry.
    #[must_use]
    pub fn file(path: impl Into<String>, size: u64, content_locator: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::File,
            path: path.into(),
            size,
            content_locator: Some(content_locator.into()),
        }
    }

    /// Create a directory entry.
    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Directory,
            path: path.into(),
            size: 0,
            content_locator: None,
        }
    }
}

/// How to obtain the bytes of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Bytes already held in memory.
    Memory(Vec<u8>),
    /// A local file, read when the archive is assembled.
    Disk(PathBuf),
    /// A URL fetched (without credentials) when the archive is assembled.
    Remote(String),
}

impl FileSource {
    /// Whether the bytes live on the network.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// The unit of work for archiving: a hierarchical path plus a byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Full hierarchical path, `/`-separated.
    ///
    /// Remote paths are prefixed with the repository name; local directory
    /// selections are prefixed with the chosen directory's name.
    pub original_path: String,
    /// Where the bytes come from.
    pub source: FileSource,
}

impl FileDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub fn new(original_path: impl Into<String>, source: FileSource) -> Self {
        Self {
            original_path: original_path.into(),
            source,
        }
    }
}

/// A descriptor paired with its flattened name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedFile {
    /// Full hierarchical path.
    pub original_path: String,
    /// Name used inside the archive.
    pub flattened_name: String,
    /// Where the bytes come from.
    pub source: FileSource,
}

/// Aggregate produced by the estimate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationEstimate {
    /// Number of files found.
    pub file_count: u64,
    /// Sum of the files' sizes in bytes.
    pub total_size: u64,
}

impl EnumerationEstimate {
    /// Add another estimate to this one.
    pub fn absorb(&mut self, other: Self) {
        self.file_count += other.file_count;
        self.total_size += other.total_size;
    }
}

/// Archive assembly status, as reported to progress observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Fetching entries and writing them into the archive.
    Zipping,
    /// Serializing the archive.
    Preparing,
    /// Archive is complete and being handed to its destination.
    Downloading,
}

impl DownloadStatus {
    /// Short label for display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Zipping => "zipping",
            Self::Preparing => "preparing",
            Self::Downloading => "downloading",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
