//! Persistent settings (`config.toml`).
//!
//! Settings are read once per command and passed explicitly into the
//! library; nothing in `flatkit` reads them on its own.

use anyhow::{Context, Result, bail};
use flatkit::{DEFAULT_ARCHIVE_NAME, DEFAULT_DELIMITER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Delimiter that replaces `/` in flattened names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    /// Default output path for the zip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Stored GitHub token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Where the active GitHub token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `--token` flag or `GITHUB_TOKEN`
    Session,
    /// `config.toml`
    Stored,
    /// No token; unauthenticated rate limit applies
    None,
}

impl TokenSource {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Session => "--token / GITHUB_TOKEN",
            Self::Stored => "stored in config file",
            Self::None => "not set (60 requests/hour)",
        }
    }
}

impl Settings {
    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&paths::config_file()?)
    }

    /// Load settings from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Save settings to `path`, readable only by the owner on Unix
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Could not serialize config")?;
        fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Could not restrict {}", path.display()))?;
        }
        Ok(())
    }

    /// Effective delimiter: `flag`, then config, then the default
    pub fn delimiter(&self, flag: Option<&str>) -> Result<String> {
        let delimiter = flag
            .or(self.delimiter.as_deref())
            .unwrap_or(DEFAULT_DELIMITER);
        validate_delimiter(delimiter)?;
        Ok(delimiter.to_string())
    }

    /// Effective output path: `flag`, then config, then the default
    pub fn output(&self, flag: Option<&Path>) -> PathBuf {
        if let Some(path) = flag {
            return path.to_path_buf();
        }
        self.output
            .as_deref()
            .map(paths::expand)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_NAME))
    }

    /// Effective token and where it came from
    pub fn token(&self, session: Option<&str>) -> (Option<String>, TokenSource) {
        if let Some(token) = session.filter(|t| !t.trim().is_empty()) {
            return (Some(token.to_string()), TokenSource::Session);
        }
        match self.token.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(token) => (Some(token.to_string()), TokenSource::Stored),
            None => (None, TokenSource::None),
        }
    }
}

/// Reject the empty delimiter, which would merge path segments
pub fn validate_delimiter(delimiter: &str) -> Result<()> {
    if delimiter.is_empty() {
        bail!("Delimiter cannot be empty");
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load_from(&temp.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.delimiter(None).unwrap(), "))");
        assert_eq!(settings.output(None), PathBuf::from("flattened_files.zip"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let settings = Settings {
            delimiter: Some("__".to_string()),
            output: Some("/tmp/out.zip".to_string()),
            token: Some("ghp_secret".to_string()),
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        Settings::default().save_to(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "delimiter = [").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_delimiter_precedence() {
        let settings = Settings {
            delimiter: Some("__".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.delimiter(None).unwrap(), "__");
        assert_eq!(settings.delimiter(Some("--")).unwrap(), "--");
    }

    #[test]
    fn test_delimiter_validation() {
        assert!(validate_delimiter("").is_err());
        assert!(validate_delimiter("a/b").is_ok());
        assert!(validate_delimiter("))").is_ok());
        assert!(Settings::default().delimiter(Some("")).is_err());
    }

    #[test]
    fn test_output_precedence() {
        let settings = Settings {
            output: Some("/tmp/configured.zip".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.output(None), PathBuf::from("/tmp/configured.zip"));
        assert_eq!(
            settings.output(Some(Path::new("flag.zip"))),
            PathBuf::from("flag.zip")
        );
    }

    #[test]
    fn test_token_resolution() {
        let stored = Settings {
            token: Some("stored".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            stored.token(Some("session")),
            (Some("session".to_string()), TokenSource::Session)
        );
        assert_eq!(
            stored.token(None),
            (Some("stored".to_string()), TokenSource::Stored)
        );
        assert_eq!(
            stored.token(Some("  ")),
            (Some("stored".to_string()), TokenSource::Stored)
        );
        assert_eq!(Settings::default().token(None), (None, TokenSource::None));
    }
}
