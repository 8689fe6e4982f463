//! # flatkit
//!
//! Pure Rust library for flattening directory trees into a single zip.
//!
//! Every file's hierarchical path is folded into its archive name, so a
//! tree can be attached wherever only a flat list of files is accepted:
//! `hello/src/main.rs` becomes `hello))src))main.rs`.
//!
//! This crate provides functionality for:
//! - Parsing GitHub URLs into repository locations
//! - Estimating the size of a remote tree before fetching it (cancellable)
//! - Collecting remote and local files as descriptors
//! - Assembling a zip that survives individual fetch failures
//!
//! ## Example
//!
//! ```no_run
//! use flatkit::{CancelFlag, Client, DEFAULT_DELIMITER, location, names};
//! use flatkit::archive::NoProgress;
//!
//! let client = Client::new(std::env::var("GITHUB_TOKEN").ok());
//! let root = location::parse_reference("https://github.com/octo/hello/tree/main/src")?;
//!
//! // Estimate first, then commit
//! let cancel = CancelFlag::new();
//! let estimate = client.estimate(&root, &cancel)?;
//! println!("{} files, {} bytes", estimate.file_count, estimate.total_size);
//!
//! let descriptors = client.collect(&root, &CancelFlag::new())?;
//! let files = names::flatten_all(&descriptors, DEFAULT_DELIMITER);
//! let assembly = client.assemble(&files, &NoProgress)?;
//! std::fs::write("flattened_files.zip", &assembly.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod backend;
pub mod cancel;
pub mod error;
pub mod local;
pub mod location;
pub mod names;
pub mod types;
pub mod walk;

pub use cancel::CancelFlag;
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    DEFAULT_ARCHIVE_NAME, DEFAULT_BRANCH, DEFAULT_DELIMITER, DownloadStatus, EntryKind,
    EnumerationEstimate, FileDescriptor, FileSource, FlattenedFile, RemoteEntry,
    RepositoryLocation,
};

use archive::{Assembler, Assembly, AssemblyProgress, ZipArchiveWriter};
use backend::Backend;
pub use backend::MockBackend;
use backend::github::GitHubBackend;
use walk::{WalkObserver, Walker};

/// High-level client tying traversal and assembly to one backend.
///
/// # Example
///
/// ```
/// use flatkit::{CancelFlag, Client, MockBackend, RepositoryLocation};
///
/// let client = Client::with_backend(Box::new(MockBackend::with_sample_tree()));
/// let root = RepositoryLocation::new("octo", "hello", "main", "");
/// let estimate = client.estimate(&root, &CancelFlag::new()).unwrap();
/// assert_eq!(estimate.file_count, 3);
/// ```
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client on the GitHub backend, optionally authenticated.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            backend: Box::new(GitHubBackend::new().with_token(token)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Remote Trees
    // =========================================================================

    /// Count files and bytes under `location`. Cancellable through `cancel`.
    pub fn estimate(
        &self,
        location: &RepositoryLocation,
        cancel: &CancelFlag,
    ) -> Result<EnumerationEstimate> {
        walk::estimate(self.backend.as_ref(), location, cancel)
    }

    /// Like [`Client::estimate`], reporting progress to `observer`.
    pub fn estimate_with(
        &self,
        location: &RepositoryLocation,
        cancel: &CancelFlag,
        observer: &dyn WalkObserver,
    ) -> Result<EnumerationEstimate> {
        Walker::new(self.backend.as_ref(), cancel.clone())
            .with_observer(observer)
            .estimate(location)
    }

    /// Collect every file under `location`. Cancellable through `cancel`.
    pub fn collect(
        &self,
        location: &RepositoryLocation,
        cancel: &CancelFlag,
    ) -> Result<Vec<FileDescriptor>> {
        walk::collect(self.backend.as_ref(), location, cancel)
    }

    /// Like [`Client::collect`], reporting progress to `observer`.
    pub fn collect_with(
        &self,
        location: &RepositoryLocation,
        cancel: &CancelFlag,
        observer: &dyn WalkObserver,
    ) -> Result<Vec<FileDescriptor>> {
        Walker::new(self.backend.as_ref(), cancel.clone())
            .with_observer(observer)
            .collect(location)
    }

    // =========================================================================
    // Archives
    // =========================================================================

    /// Build a zip from `files`, skipping entries that cannot be retrieved.
    pub fn assemble(
        &self,
        files: &[FlattenedFile],
        progress: &dyn AssemblyProgress,
    ) -> Result<Assembly> {
        Assembler::new(self.backend.as_ref()).assemble(files, ZipArchiveWriter::new(), progress)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(None)
    }
}
