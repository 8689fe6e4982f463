//! Archive assembly.
//!
//! Fetches the bytes of every [`FlattenedFile`] one at a time, writes the
//! successful ones under their flattened names, and serializes the result
//! into one zip blob. A failed entry is recorded and skipped; only a
//! failure to serialize the archive aborts the whole run.
//!
//! Status progression reported to [`AssemblyProgress`]:
//! `Zipping` → `Preparing` → `Downloading`, then `Idle` once the caller has
//! delivered the blob (see [`Assembly::save`]). A serialization failure
//! reports `Idle` directly.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{DownloadStatus, FileSource, FlattenedFile};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Destination for archive entries.
pub trait ArchiveWriter {
    /// Add one entry.
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` when `name` was already written; the archive is left
    /// unchanged. Any other error means the archive is unusable.
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Number of entries written so far.
    fn entry_count(&self) -> usize;

    /// Serialize the archive.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

/// In-memory zip writer.
///
/// Entries are deflated and stamped with a fixed modification time, so the
/// same entries in the same order always produce identical bytes. When two
/// entries share a name, the first one written is kept; writers that
/// overwrite on a repeated name, such as JSZip's `file()`, keep the last.
pub struct ZipArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
    options: SimpleFileOptions,
}

impl ZipArchiveWriter {
    /// Create an empty archive.
    #[must_use]
    pub fn new() -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
            options,
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        if self.names.contains(name) {
            return Err(Error::DuplicateEntry {
                name: name.to_string(),
            });
        }
        self.zip.start_file(name, self.options)?;
        self.zip
            .write_all(bytes)
            .map_err(|e| Error::ArchiveSerializationFailed(e.to_string()))?;
        self.names.insert(name.to_string());
        Ok(())
    }

    fn entry_count(&self) -> usize {
        self.names.len()
    }

    fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// Receives assembly notifications.
pub trait AssemblyProgress {
    /// Called whenever the status changes.
    fn on_status(&self, _status: DownloadStatus) {}

    /// Called before an entry's bytes are retrieved. `index` is 0-based.
    fn on_entry(&self, _index: usize, _total: usize, _file: &FlattenedFile) {}

    /// Called when an entry is skipped.
    fn on_failure(&self, _failure: &EntryFailure) {}
}

/// Progress sink that ignores everything.
pub struct NoProgress;

impl AssemblyProgress for NoProgress {}

/// An entry that did not make it into the archive.
#[derive(Debug)]
pub struct EntryFailure {
    /// Original path of the entry.
    pub original_path: String,
    /// Name it would have had in the archive.
    pub flattened_name: String,
    /// `EntryRetrievalFailed` or `DuplicateEntry`.
    pub error: Error,
}

/// A finished archive plus what went wrong along the way.
#[derive(Debug)]
pub struct Assembly {
    /// Serialized zip archive.
    pub bytes: Vec<u8>,
    /// Flattened names written, in order.
    pub written: Vec<String>,
    /// Entries that were skipped, in order.
    pub failures: Vec<EntryFailure>,
}

impl Assembly {
    /// Number of entries in the archive.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.written.len()
    }

    /// Whether every requested entry was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The most recent failure, if any.
    #[must_use]
    pub fn last_failure(&self) -> Option<&EntryFailure> {
        self.failures.last()
    }

    /// Write the archive to `path`, then report `Idle`.
    pub fn save(&self, path: &Path, progress: &dyn AssemblyProgress) -> Result<()> {
        let result = fs::write(path, &self.bytes).map_err(|e| Error::io(path, e));
        progress.on_status(DownloadStatus::Idle);
        result
    }
}

/// Builds archives from flattened files.
///
/// # Example
///
/// ```
/// use flatkit::archive::{Assembler, NoProgress, ZipArchiveWriter};
/// use flatkit::backend::MockBackend;
/// use flatkit::{FileSource, FlattenedFile};
///
/// let backend = MockBackend::new();
/// let files = vec![FlattenedFile {
///     original_path: "notes/todo.txt".to_string(),
///     flattened_name: "notes))todo.txt".to_string(),
///     source: FileSource::Memory(b"milk".to_vec()),
/// }];
///
/// let assembly = Assembler::new(&backend)
///     .assemble(&files, ZipArchiveWriter::new(), &NoProgress)
///     .unwrap();
/// assert_eq!(assembly.written, vec!["notes))todo.txt"]);
/// ```
pub struct Assembler<'a> {
    backend: &'a dyn Backend,
}

impl<'a> Assembler<'a> {
    /// Create an assembler that fetches remote entries through `backend`.
    #[must_use]
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Assemble `files` into `writer` and serialize it.
    ///
    /// Entries are processed sequentially in order. Per-entry failures are
    /// collected in [`Assembly::failures`].
    ///
    /// # Errors
    ///
    /// `ArchiveSerializationFailed` when the archive cannot be written or
    /// serialized; no partial blob is returned.
    pub fn assemble<W: ArchiveWriter>(
        &self,
        files: &[FlattenedFile],
        mut writer: W,
        progress: &dyn AssemblyProgress,
    ) -> Result<Assembly> {
        progress.on_status(DownloadStatus::Zipping);

        let mut written = Vec::with_capacity(files.len());
        let mut failures = Vec::new();

        for (index, file) in files.iter().enumerate() {
            progress.on_entry(index, files.len(), file);

            let outcome = self
                .retrieve(file)
                .and_then(|bytes| writer.add_entry(&file.flattened_name, &bytes));

            match outcome {
                Ok(()) => written.push(file.flattened_name.clone()),
                Err(error @ (Error::EntryRetrievalFailed { .. } | Error::DuplicateEntry { .. })) => {
                    log::warn!("Skipping {}: {error}", file.original_path);
                    let failure = EntryFailure {
                        original_path: file.original_path.clone(),
                        flattened_name: file.flattened_name.clone(),
                        error,
                    };
                    progress.on_failure(&failure);
                    failures.push(failure);
                }
                Err(error) => {
                    progress.on_status(DownloadStatus::Idle);
                    return Err(error);
                }
            }
        }

        progress.on_status(DownloadStatus::Preparing);
        let bytes = match writer.finish() {
            Ok(bytes) => bytes,
            Err(error) => {
                progress.on_status(DownloadStatus::Idle);
                return Err(error);
            }
        };
        progress.on_status(DownloadStatus::Downloading);

        Ok(Assembly {
            bytes,
            written,
            failures,
        })
    }

    /// Obtain the bytes of one entry.
    fn retrieve<'f>(&self, file: &'f FlattenedFile) -> Result<Cow<'f, [u8]>> {
        let bytes = match &file.source {
            FileSource::Memory(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
            FileSource::Disk(path) => fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| Error::io(path, e)),
            FileSource::Remote(locator) => self.backend.fetch(locator).map(Cow::Owned),
        };
        bytes.map_err(|e| Error::EntryRetrievalFailed {
            path: file.original_path.clone(),
            message: e.to_string(),
        })
    }
}
