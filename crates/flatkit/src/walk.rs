//! Recursive traversal of remote trees.
//!
//! Two independent passes share one shape:
//!
//! - [`Walker::estimate`] counts files and bytes without downloading content.
//! - [`Walker::collect`] gathers one [`FileDescriptor`] per file for archiving.
//!
//! Both are strictly sequential and depth-first: a subdirectory's whole
//! walk finishes before its next sibling is looked at, so at most one
//! request is outstanding at any time. Both poll the cancellation flag
//! after every response and before every entry, and hand it to the backend
//! so a request that never answers is given up on; a set flag wins over any
//! other outcome of the in-flight request.

use crate::backend::Backend;
use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::types::{
    EntryKind, EnumerationEstimate, FileDescriptor, FileSource, RemoteEntry, RepositoryLocation,
};

/// Receives traversal notifications, e.g. to drive a spinner.
pub trait WalkObserver {
    /// Called right before a directory is listed.
    fn on_directory(&self, _location: &RepositoryLocation) {}

    /// Called for every file the walk accounts for.
    fn on_file(&self, _entry: &RemoteEntry) {}
}

/// Observer that ignores everything.
pub struct NoObserver;

impl WalkObserver for NoObserver {}

/// Sequential depth-first walker over a [`Backend`].
///
/// # Example
///
/// ```
/// use flatkit::backend::MockBackend;
/// use flatkit::walk::Walker;
/// use flatkit::{CancelFlag, RepositoryLocation};
///
/// let backend = MockBackend::with_sample_tree();
/// let walker = Walker::new(&backend, CancelFlag::new());
/// let root = RepositoryLocation::new("octo", "hello", "main", "");
///
/// let estimate = walker.estimate(&root).unwrap();
/// assert_eq!((estimate.file_count, estimate.total_size), (3, 60));
/// ```
pub struct Walker<'a> {
    backend: &'a dyn Backend,
    cancel: CancelFlag,
    observer: &'a dyn WalkObserver,
}

impl<'a> Walker<'a> {
    /// Create a walker that polls `cancel`.
    #[must_use]
    pub fn new(backend: &'a dyn Backend, cancel: CancelFlag) -> Self {
        Self {
            backend,
            cancel,
            observer: &NoObserver,
        }
    }

    /// Report progress to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn WalkObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Count files and total size under `location`.
    ///
    /// # Errors
    ///
    /// `OperationAborted` when the flag is observed, `RemoteFetchFailed` when
    /// any listing at any depth fails. No partial estimate is returned.
    pub fn estimate(&self, location: &RepositoryLocation) -> Result<EnumerationEstimate> {
        let mut total = EnumerationEstimate::default();
        for entry in self.list(location)? {
            self.cancel.check()?;
            match entry.kind {
                EntryKind::File => {
                    self.observer.on_file(&entry);
                    total.file_count += 1;
                    total.total_size += entry.size;
                }
                EntryKind::Directory => {
                    total.absorb(self.estimate(&location.with_subpath(&entry.path))?);
                }
                EntryKind::Other => log::debug!("Skipping {} (not a file or directory)", entry.path),
            }
        }
        Ok(total)
    }

    /// Collect every file under `location` as a descriptor.
    ///
    /// Descriptor paths are prefixed with the repository name, so
    /// `src/main.rs` in `octo/hello` becomes `hello/src/main.rs`.
    pub fn collect(&self, location: &RepositoryLocation) -> Result<Vec<FileDescriptor>> {
        let mut files = Vec::new();
        self.collect_into(location, &mut files)?;
        Ok(files)
    }

    fn collect_into(
        &self,
        location: &RepositoryLocation,
        files: &mut Vec<FileDescriptor>,
    ) -> Result<()> {
        for entry in self.list(location)? {
            self.cancel.check()?;
            match entry.kind {
                EntryKind::File => {
                    self.observer.on_file(&entry);
                    let Some(locator) = entry.content_locator else {
                        log::warn!("Skipping {}: no download URL", entry.path);
                        continue;
                    };
                    files.push(FileDescriptor::new(
                        format!("{}/{}", location.repository, entry.path),
                        FileSource::Remote(locator),
                    ));
                }
                EntryKind::Directory => {
                    self.collect_into(&location.with_subpath(&entry.path), files)?;
                }
                EntryKind::Other => log::debug!("Skipping {} (not a file or directory)", entry.path),
            }
        }
        Ok(())
    }

    /// One listing request, bracketed by cancellation checks. The backend
    /// also sees the flag, so a stalled request is abandoned on cancel.
    fn list(&self, location: &RepositoryLocation) -> Result<Vec<RemoteEntry>> {
        self.cancel.check()?;
        self.observer.on_directory(location);
        let listing = self.backend.list(location, &self.cancel);
        self.cancel.check()?;
        listing
    }
}

/// Run the estimate pass with no observer.
pub fn estimate(
    backend: &dyn Backend,
    location: &RepositoryLocation,
    cancel: &CancelFlag,
) -> Result<EnumerationEstimate> {
    Walker::new(backend, cancel.clone()).estimate(location)
}

/// Run the commit pass with no observer.
pub fn collect(
    backend: &dyn Backend,
    location: &RepositoryLocation,
    cancel: &CancelFlag,
) -> Result<Vec<FileDescriptor>> {
    Walker::new(backend, cancel.clone()).collect(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::error::Error;
    use std::cell::RefCell;

    fn root() -> RepositoryLocation {
        RepositoryLocation::new("octo", "hello", "main", "")
    }

    #[test]
    fn test_estimate_sums_nested_tree() {
        let backend = MockBackend::with_sample_tree();
        let result = estimate(&backend, &root(), &CancelFlag::new()).unwrap();
        assert_eq!(
            result,
            EnumerationEstimate {
                file_count: 3,
                total_size: 60
            }
        );
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let backend = MockBackend::with_sample_tree();
        let first = estimate(&backend, &root(), &CancelFlag::new()).unwrap();
        let second = estimate(&backend, &root(), &CancelFlag::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_estimate_walks_depth_first_in_order() {
        let mut backend = MockBackend::new();
        backend.add_listing(
            "",
            vec![RemoteEntry::directory("a"), RemoteEntry::directory("b")],
        );
        backend.add_listing("a", vec![RemoteEntry::directory("a/x")]);
        backend.add_listing("a/x", vec![]);
        backend.add_listing("b", vec![]);

        estimate(&backend, &root(), &CancelFlag::new()).unwrap();
        assert_eq!(backend.list_requests(), vec!["", "a", "a/x", "b"]);
    }

    #[test]
    fn test_estimate_starts_at_subpath() {
        let backend = MockBackend::with_sample_tree();
        let result = estimate(&backend, &root().with_subpath("docs"), &CancelFlag::new()).unwrap();
        assert_eq!(result.file_count, 2);
        assert_eq!(result.total_size, 50);
    }

    #[test]
    fn test_estimate_skips_other_kinds() {
        let mut backend = MockBackend::new();
        backend.add_listing(
            "",
            vec![
                RemoteEntry::file("a.txt", 5, "mock://a"),
                RemoteEntry {
                    kind: EntryKind::Other,
                    path: "vendor".to_string(),
                    size: 0,
                    content_locator: None,
                },
            ],
        );
        let result = estimate(&backend, &root(), &CancelFlag::new()).unwrap();
        assert_eq!(result.file_count, 1);
        assert_eq!(backend.list_requests().len(), 1);
    }

    #[test]
    fn test_estimate_cancelled_before_start_issues_no_requests() {
        let backend = MockBackend::with_sample_tree();
        let flag = CancelFlag::new();
        flag.cancel();

        let err = estimate(&backend, &root(), &flag).unwrap_err();
        assert!(matches!(err, Error::OperationAborted));
        assert!(backend.list_requests().is_empty());
    }

    #[test]
    fn test_estimate_settles_when_listing_never_answers() {
        let mut backend = MockBackend::with_sample_tree();
        backend.hang_on("docs/deep");
        let flag = CancelFlag::new();
        let handle = flag.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            handle.cancel();
        });

        let err = estimate(&backend, &root(), &flag).unwrap_err();
        assert!(matches!(err, Error::OperationAborted));
        assert_eq!(backend.list_requests(), vec!["", "docs", "docs/deep"]);
    }

    #[test]
    fn test_collect_settles_when_listing_never_answers() {
        let mut backend = MockBackend::with_sample_tree();
        backend.hang_on("");
        let flag = CancelFlag::new();
        let handle = flag.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            handle.cancel();
        });

        assert!(collect(&backend, &root(), &flag).unwrap_err().is_aborted());
    }

    #[test]
    fn test_estimate_cancelled_while_first_request_in_flight() {
        let mut backend = MockBackend::with_sample_tree();
        let flag = CancelFlag::new();
        backend.cancel_on_request(1, flag.clone());

        let err = estimate(&backend, &root(), &flag).unwrap_err();
        assert!(err.is_aborted());
        assert_eq!(backend.list_requests(), vec![""]);
    }

    #[test]
    fn test_estimate_cancelled_mid_walk_stops_descent() {
        let mut backend = MockBackend::with_sample_tree();
        let flag = CancelFlag::new();
        backend.cancel_on_request(2, flag.clone());

        let err = estimate(&backend, &root(), &flag).unwrap_err();
        assert!(matches!(err, Error::OperationAborted));
        assert_eq!(backend.list_requests(), vec!["", "docs"]);
    }

    #[test]
    fn test_abort_wins_over_failed_response() {
        let mut backend = MockBackend::with_sample_tree();
        backend.add_failure("docs", 500, "boom");
        let flag = CancelFlag::new();
        backend.cancel_on_request(2, flag.clone());

        let err = estimate(&backend, &root(), &flag).unwrap_err();
        assert!(matches!(err, Error::OperationAborted));
    }

    #[test]
    fn test_estimate_failure_at_depth_two_aborts_everything() {
        let mut backend = MockBackend::with_sample_tree();
        backend.add_failure("docs/deep", 403, "API rate limit exceeded");

        let err = estimate(&backend, &root(), &CancelFlag::new()).unwrap_err();
        match err {
            Error::RemoteFetchFailed { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "API rate limit exceeded");
            }
            other => panic!("Expected RemoteFetchFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_collect_prefixes_repository_name() {
        let backend = MockBackend::with_sample_tree();
        let files = collect(&backend, &root(), &CancelFlag::new()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.original_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["hello/a.txt", "hello/docs/b.txt", "hello/docs/deep/c.txt"]
        );
        assert_eq!(
            files[2].source,
            FileSource::Remote("mock://docs/deep/c.txt".to_string())
        );
    }

    #[test]
    fn test_collect_skips_files_without_locator() {
        let mut backend = MockBackend::new();
        backend.add_listing(
            "",
            vec![RemoteEntry {
                kind: EntryKind::File,
                path: "big.bin".to_string(),
                size: 1,
                content_locator: None,
            }],
        );
        let files = collect(&backend, &root(), &CancelFlag::new()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_collect_is_cancellable() {
        let mut backend = MockBackend::with_sample_tree();
        let flag = CancelFlag::new();
        backend.cancel_on_request(2, flag.clone());

        let err = collect(&backend, &root(), &flag).unwrap_err();
        assert!(err.is_aborted());
    }

    #[test]
    fn test_collect_failure_returns_no_partial_list() {
        let mut backend = MockBackend::with_sample_tree();
        backend.add_failure("docs", 404, "Not Found");
        let result = collect(&backend, &root(), &CancelFlag::new());
        assert!(matches!(
            result,
            Err(Error::RemoteFetchFailed { status: 404, .. })
        ));
    }

    #[test]
    fn test_walker_observer_sees_directories_and_files() {
        struct Recorder {
            dirs: RefCell<Vec<String>>,
            files: RefCell<usize>,
        }
        impl WalkObserver for Recorder {
            fn on_directory(&self, location: &RepositoryLocation) {
                self.dirs.borrow_mut().push(location.subpath.clone());
            }
            fn on_file(&self, _entry: &RemoteEntry) {
                *self.files.borrow_mut() += 1;
            }
        }

        let recorder = Recorder {
            dirs: RefCell::new(Vec::new()),
            files: RefCell::new(0),
        };
        let backend = MockBackend::with_sample_tree();
        Walker::new(&backend, CancelFlag::new())
            .with_observer(&recorder)
            .estimate(&root())
            .unwrap();

        assert_eq!(*recorder.dirs.borrow(), vec!["", "docs", "docs/deep"]);
        assert_eq!(*recorder.files.borrow(), 3);
    }
}
