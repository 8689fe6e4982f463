//! GitHub contents backend.
//!
//! This module provides the [`GitHubBackend`] implementation, which lists
//! directories through `GET /repos/{owner}/{repo}/contents/{path}` and
//! downloads raw file content from the `download_url` of each file.
//!
//! # Rate Limiting
//!
//! The GitHub API allows 60 unauthenticated requests per hour. Supplying a
//! token raises that to 5000. The token is only attached to listing
//! requests; content downloads go to public raw URLs.

use crate::backend::Backend;
use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::types::{EntryKind, RemoteEntry, RepositoryLocation};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Deserialize;
use std::sync::mpsc;
use std::thread;

/// Maximum size of a single downloaded file (100 MB).
const MAX_BODY_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum size of a directory listing response (10 MB).
const MAX_LISTING_SIZE: u64 = 10 * 1024 * 1024;

const USER_AGENT: &str = "foldflat";

/// Characters escaped inside one path segment of the contents URL.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// GitHub contents backend.
///
/// # Example
///
/// ```no_run
/// use flatkit::backend::github::GitHubBackend;
/// use flatkit::backend::Backend;
/// use flatkit::{CancelFlag, location};
///
/// let backend = GitHubBackend::new().with_token(std::env::var("GITHUB_TOKEN").ok());
/// let root = location::parse("https://github.com/octo/hello").unwrap();
/// let entries = backend.list(&root, &CancelFlag::new()).unwrap();
/// println!("{} entries", entries.len());
/// ```
pub struct GitHubBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// GitHub API base URL.
    api_base: String,
    /// Personal access token for listing requests.
    token: Option<String>,
}

impl GitHubBackend {
    /// Create a new GitHub backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_base("https://api.github.com")
    }

    /// Create a backend with a custom API base (for testing or GitHub Enterprise).
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        // Non-2xx responses are inspected so their body can be surfaced.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a token to every listing request. Empty tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Whether listing requests are authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Build the contents API URL for a location.
    fn contents_url(&self, location: &RepositoryLocation) -> String {
        let path = location
            .subpath
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, location.owner, location.repository, path
        )
    }
}

impl Default for GitHubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for GitHubBackend {
    fn list(
        &self,
        location: &RepositoryLocation,
        cancel: &CancelFlag,
    ) -> Result<Vec<RemoteEntry>> {
        let request = ListingRequest {
            agent: self.agent.clone(),
            url: self.contents_url(location),
            pinned_ref: location.pinned_ref().map(str::to_string),
            token: self.token.clone(),
        };
        log::debug!("Listing {}", request.url);

        // ureq blocks until the server answers, so the call runs on its own
        // thread and is abandoned if the flag is set first.
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("flatkit-list".to_string())
            .spawn(move || {
                let _ = tx.send(request.send());
            })
            .map_err(|e| Error::http(format!("could not start listing request: {e}")))?;

        cancel.wait_for(&rx)
    }

    fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        log::debug!("Fetching {locator}");

        let mut response = self
            .agent
            .get(locator)
            .header("User-Agent", USER_AGENT)
            .call()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(Error::RemoteFetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_vec()
            .map_err(|e| Error::http(e.to_string()))
    }
}

/// Everything one listing call needs, owned so it can move to a worker.
struct ListingRequest {
    agent: ureq::Agent,
    url: String,
    pinned_ref: Option<String>,
    token: Option<String>,
}

impl ListingRequest {
    fn send(self) -> Result<Vec<RemoteEntry>> {
        let mut request = self
            .agent
            .get(&self.url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT);
        if let Some(branch) = &self.pinned_ref {
            request = request.query("ref", branch);
        }
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {token}"));
        }

        let mut response = request.call()?;
        let status = response.status();
        if let Some(remaining) = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
        {
            log::debug!("GitHub rate limit remaining: {remaining}");
        }

        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_LISTING_SIZE)
            .read_to_string()?;

        if !status.is_success() {
            log::debug!("Listing {} failed with {status}", self.url);
            return Err(Error::RemoteFetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let listing: GitHubListing = serde_json::from_str(&body)?;
        Ok(listing.into_entries())
    }
}

// =============================================================================
// GitHub API response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GitHubContent {
    #[serde(rename = "type")]
    kind: EntryKind,
    path: String,
    #[serde(default)]
    size: u64,
    download_url: Option<String>,
}

/// A directory yields an array; a path naming a file yields one object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitHubListing {
    Directory(Vec<GitHubContent>),
    Single(GitHubContent),
}

impl GitHubListing {
    fn into_entries(self) -> Vec<RemoteEntry> {
        match self {
            Self::Directory(items) => items.into_iter().map(Into::into).collect(),
            Self::Single(item) => vec![item.into()],
        }
    }
}

impl From<GitHubContent> for RemoteEntry {
    fn from(c: GitHubContent) -> Self {
        Self {
            kind: c.kind,
            path: c.path,
            size: c.size,
            content_locator: c.download_url,
        }
    }
}
