//! Backend trait and implementations for reading remote trees.
//!
//! This module provides the [`Backend`] trait and implementations for
//! different tree sources. The primary implementation is
//! [`github::GitHubBackend`], which talks to GitHub's contents API.
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use flatkit::backend::{Backend, MockBackend};
//! use flatkit::{CancelFlag, RemoteEntry, RepositoryLocation};
//!
//! let mut mock = MockBackend::new();
//! mock.add_listing("", vec![RemoteEntry::file("README.md", 12, "mock://readme")]);
//!
//! let root = RepositoryLocation::new("octo", "hello", "main", "");
//! let entries = mock.list(&root, &CancelFlag::new()).unwrap();
//! assert_eq!(entries.len(), 1);
//! ```

pub mod github;

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::types::{RemoteEntry, RepositoryLocation};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Backend trait for reading remote trees.
///
/// Implementations issue exactly one request per call; traversal order is
/// handled by the caller.
pub trait Backend: Send + Sync {
    /// List the immediate children of `location`.
    ///
    /// A location that names a single file yields that file alone. Setting
    /// `cancel` while the request is pending makes the call return promptly.
    ///
    /// # Errors
    ///
    /// Returns `Error::RemoteFetchFailed` for non-success responses and
    /// `Error::OperationAborted` when `cancel` is set before a response.
    fn list(&self, location: &RepositoryLocation, cancel: &CancelFlag)
    -> Result<Vec<RemoteEntry>>;

    /// Download raw file content from a content locator.
    ///
    /// No credentials are sent; the locator must be public or pre-signed.
    fn fetch(&self, locator: &str) -> Result<Vec<u8>>;
}

/// Mock backend for testing without network access.
///
/// Listings are keyed by repository subpath. Every request is recorded so
/// tests can assert how many were issued and in which order.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    listings: Arc<Mutex<HashMap<String, Vec<RemoteEntry>>>>,
    failures: Arc<Mutex<HashMap<String, (u16, String)>>>,
    contents: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requests: Arc<Mutex<Vec<String>>>,
    cancel_on: Arc<Mutex<Option<(usize, CancelFlag)>>>,
    hanging: Arc<Mutex<HashSet<String>>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listing returned for `subpath`.
    pub fn add_listing(&mut self, subpath: impl Into<String>, entries: Vec<RemoteEntry>) {
        let mut listings = self.listings.lock().unwrap();
        listings.insert(subpath.into(), entries);
    }

    /// Make listing `subpath` fail with the given status and body.
    pub fn add_failure(&mut self, subpath: impl Into<String>, status: u16, body: impl Into<String>) {
        let mut failures = self.failures.lock().unwrap();
        failures.insert(subpath.into(), (status, body.into()));
    }

    /// Set the bytes served for a content locator.
    pub fn add_content(&mut self, locator: impl Into<String>, data: Vec<u8>) {
        let mut contents = self.contents.lock().unwrap();
        contents.insert(locator.into(), data);
    }

    /// Set `flag` while the `nth` listing request (1-indexed) is in flight.
    ///
    /// The request still completes, mimicking an abort that lands between
    /// dispatch and response.
    pub fn cancel_on_request(&mut self, nth: usize, flag: CancelFlag) {
        *self.cancel_on.lock().unwrap() = Some((nth, flag));
    }

    /// Never answer the listing for `subpath`, like a stalled server.
    ///
    /// The request only returns, with `OperationAborted`, once its cancel
    /// flag is set.
    pub fn hang_on(&mut self, subpath: impl Into<String>) {
        self.hanging.lock().unwrap().insert(subpath.into());
    }

    /// Subpaths of the listing requests issued so far, in order.
    #[must_use]
    pub fn list_requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.strip_prefix("list:").map(str::to_string))
            .collect()
    }

    /// Locators of the content fetches issued so far, in order.
    #[must_use]
    pub fn fetch_requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.strip_prefix("fetch:").map(str::to_string))
            .collect()
    }

    /// A tree with files of sizes 10, 20 and 30 under two nested directories.
    ///
    /// ```text
    /// a.txt (10)
    /// docs/b.txt (20)
    /// docs/deep/c.txt (30)
    /// ```
    #[must_use]
    pub fn with_sample_tree() -> Self {
        let mut mock = Self::new();
        mock.add_listing(
            "",
            vec![
                RemoteEntry::file("a.txt", 10, "mock://a.txt"),
                RemoteEntry::directory("docs"),
            ],
        );
        mock.add_listing(
            "docs",
            vec![
                RemoteEntry::file("docs/b.txt", 20, "mock://docs/b.txt"),
                RemoteEntry::directory("docs/deep"),
            ],
        );
        mock.add_listing(
            "docs/deep",
            vec![RemoteEntry::file("docs/deep/c.txt", 30, "mock://docs/deep/c.txt")],
        );
        mock.add_content("mock://a.txt", b"a".repeat(10));
        mock.add_content("mock://docs/b.txt", b"b".repeat(20));
        mock.add_content("mock://docs/deep/c.txt", b"c".repeat(30));
        mock
    }
}

impl Backend for MockBackend {
    fn list(
        &self,
        location: &RepositoryLocation,
        cancel: &CancelFlag,
    ) -> Result<Vec<RemoteEntry>> {
        let issued = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(format!("list:{}", location.subpath));
            requests.iter().filter(|r| r.starts_with("list:")).count()
        };

        if let Some((nth, flag)) = self.cancel_on.lock().unwrap().as_ref()
            && *nth == issued
        {
            flag.cancel();
        }

        let hangs = self.hanging.lock().unwrap().contains(&location.subpath);
        if hangs {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            return Err(Error::OperationAborted);
        }

        if let Some((status, body)) = self.failures.lock().unwrap().get(&location.subpath) {
            return Err(Error::RemoteFetchFailed {
                status: *status,
                body: body.clone(),
            });
        }

        let listings = self.listings.lock().unwrap();
        listings
            .get(&location.subpath)
            .cloned()
            .ok_or_else(|| Error::RemoteFetchFailed {
                status: 404,
                body: r#"{"message":"Not Found"}"#.to_string(),
            })
    }

    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("fetch:{locator}"));

        let contents = self.contents.lock().unwrap();
        contents
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::http(format!("mock content not configured: {locator}")))
    }
}
