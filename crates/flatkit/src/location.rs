//! Parse GitHub URLs into [`RepositoryLocation`]s.
//!
//! Accepted shape: `[scheme://][www.]github.com/<owner>/<repo>[/tree/<branch>[/<subpath>]]`.
//! Query strings, fragments, a trailing slash, and a `.git` suffix on the
//! repository name are ignored. The subpath is percent-decoded once, so it
//! matches the paths the contents API reports. No network access happens here.

use crate::error::{Error, Result};
use crate::types::{DEFAULT_BRANCH, RepositoryLocation};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;

static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com/([^/]+)/([^/]+)(?:/tree/([^/]+))?(?:/(.+))?")
        .expect("GitHub URL pattern is valid")
});

/// Parse a repository URL.
///
/// Returns `None` when owner and repository cannot be extracted.
///
/// # Example
///
/// ```
/// use flatkit::location::parse;
///
/// let loc = parse("https://github.com/octo/hello/tree/dev/src/bin").unwrap();
/// assert_eq!(loc.owner, "octo");
/// assert_eq!(loc.branch, "dev");
/// assert_eq!(loc.subpath, "src/bin");
///
/// let loc = parse("github.com/octo/hello").unwrap();
/// assert_eq!(loc.branch, "main");
/// ```
#[must_use]
pub fn parse(input: &str) -> Option<RepositoryLocation> {
    let trimmed = strip_suffixes(input.trim());
    let caps = GITHUB_URL.captures(trimmed)?;

    let owner = caps.get(1)?.as_str();
    let repository = caps.get(2)?.as_str();
    let repository = repository.strip_suffix(".git").unwrap_or(repository);
    if owner.is_empty() || repository.is_empty() {
        return None;
    }

    let branch = caps.get(3).map(|m| m.as_str());
    let subpath = caps
        .get(4)
        .map(|m| m.as_str().trim_matches('/'))
        .unwrap_or_default();

    Some(RepositoryLocation {
        owner: owner.to_string(),
        repository: repository.to_string(),
        branch: branch.unwrap_or(DEFAULT_BRANCH).to_string(),
        subpath: decode(subpath),
        branch_explicit: branch.is_some(),
    })
}

/// Parse a repository URL, failing with [`Error::InvalidReference`].
pub fn parse_reference(input: &str) -> Result<RepositoryLocation> {
    parse(input).ok_or_else(|| Error::InvalidReference(input.trim().to_string()))
}

/// Undo URL escaping (`my%20notes` -> `my notes`). Invalid UTF-8 is kept as typed.
fn decode(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map_or_else(|_| segment.to_string(), |decoded| decoded.into_owned())
}

/// Drop query, fragment, and trailing slashes.
fn strip_suffixes(input: &str) -> &str {
    let end = input.find(['?', '#']).unwrap_or(input.len());
    input[..end].trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_root() {
        let loc = parse("https://github.com/octo/hello").unwrap();
        assert_eq!(loc.owner, "octo");
        assert_eq!(loc.repository, "hello");
        assert_eq!(loc.branch, DEFAULT_BRANCH);
        assert_eq!(loc.subpath, "");
        assert!(!loc.branch_explicit);
    }

    #[test]
    fn test_parse_branch_and_subpath() {
        let loc = parse("https://github.com/octo/hello/tree/feature-x/src/lib/util").unwrap();
        assert_eq!(loc.branch, "feature-x");
        assert_eq!(loc.subpath, "src/lib/util");
        assert!(loc.branch_explicit);
    }

    #[test]
    fn test_parse_branch_only() {
        let loc = parse("github.com/octo/hello/tree/dev").unwrap();
        assert_eq!(loc.branch, "dev");
        assert_eq!(loc.subpath, "");
    }

    #[test]
    fn test_parse_without_scheme_or_with_www() {
        assert!(parse("github.com/octo/hello").is_some());
        let loc = parse("https://www.github.com/octo/hello/tree/main/docs").unwrap();
        assert_eq!(loc.subpath, "docs");
    }

    #[test]
    fn test_parse_strips_noise() {
        let loc = parse("  https://github.com/octo/hello.git/  ").unwrap();
        assert_eq!(loc.repository, "hello");

        let loc = parse("https://github.com/octo/hello/tree/main/docs/?tab=readme#top").unwrap();
        assert_eq!(loc.subpath, "docs");
    }

    #[test]
    fn test_parse_subpath_matches_trailing_segments() {
        for sub in ["a", "a/b", "deep/er/still/file.rs"] {
            let url = format!("https://github.com/o/r/tree/main/{sub}");
            assert_eq!(parse(&url).unwrap().subpath, sub);
        }
    }

    #[test]
    fn test_parse_decodes_escaped_subpath() {
        let loc = parse("https://github.com/octo/hello/tree/main/docs/my%20notes").unwrap();
        assert_eq!(loc.subpath, "docs/my notes");

        let loc = parse("https://github.com/octo/hello/tree/main/issues/%231").unwrap();
        assert_eq!(loc.subpath, "issues/#1");
    }

    #[test]
    fn test_parse_keeps_undecodable_subpath() {
        let loc = parse("https://github.com/octo/hello/tree/main/bad%FF").unwrap();
        assert_eq!(loc.subpath, "bad%FF");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("").is_none());
        assert!(parse("https://gitlab.com/octo/hello").is_none());
        assert!(parse("https://github.com/octo").is_none());
        assert!(parse("not a url").is_none());
    }

    #[test]
    fn test_parse_reference_error() {
        let err = parse_reference("https://example.com/x").unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));
    }
}
