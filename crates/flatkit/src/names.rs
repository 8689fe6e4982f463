//! Path-to-name flattening.
//!
//! A hierarchical path like `repo/src/main.rs` becomes one file name by
//! joining its segments with a delimiter: `repo))src))main.rs`. The result
//! is not checked for characters that are unsafe in file names, and
//! collisions are not resolved here.

use crate::types::{FileDescriptor, FlattenedFile};

/// Separator between segments of an original path.
pub const PATH_SEPARATOR: char = '/';

/// Characters that commonly break file names on at least one platform.
pub const UNSAFE_NAME_CHARS: &[char] = &[':', '*', '?', '"', '<', '>', '|'];

/// Flatten `path` by replacing every separator with `delimiter`.
///
/// # Example
///
/// ```
/// use flatkit::names::flatten_name;
///
/// assert_eq!(flatten_name("repo/src/main.rs", "))"), "repo))src))main.rs");
/// assert_eq!(flatten_name("README.md", "__"), "README.md");
/// ```
#[must_use]
pub fn flatten_name(path: &str, delimiter: &str) -> String {
    path.split(PATH_SEPARATOR)
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Pair every descriptor with its flattened name, preserving order.
#[must_use]
pub fn flatten_all(descriptors: &[FileDescriptor], delimiter: &str) -> Vec<FlattenedFile> {
    descriptors
        .iter()
        .map(|d| FlattenedFile {
            original_path: d.original_path.clone(),
            flattened_name: flatten_name(&d.original_path, delimiter),
            source: d.source.clone(),
        })
        .collect()
}

/// Characters of `delimiter` that are risky inside file names.
#[must_use]
pub fn unsafe_chars(delimiter: &str) -> Vec<char> {
    let mut found: Vec<char> = delimiter
        .chars()
        .filter(|c| UNSAFE_NAME_CHARS.contains(c))
        .collect();
    found.dedup();
    found
}
