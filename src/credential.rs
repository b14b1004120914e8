//! API key handling and the on-disk credential store.

use crate::error::{MotionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the single entry the store manages.
pub const CREDENTIAL_ENTRY: &str = "gemini-api-key";

/// Env var that overrides the credential file location.
pub const CREDENTIALS_PATH_ENV: &str = "MOTIONFRAME_CREDENTIALS";

/// Env var consulted when no key is stored.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// An API key. Its value never appears in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a key, rejecting blank input.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(MotionError::MissingCredential);
        }
        Ok(Self(key))
    }

    /// Returns the raw key for use on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns a masked form like `AIza…9xQk` for display.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

/// File-backed store holding a single named API key entry.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Uses an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `MOTIONFRAME_CREDENTIALS` if set, else
    /// `<config dir>/motionframe/credentials.json`.
    pub fn default_location() -> Result<Self> {
        if let Ok(path) = std::env::var(CREDENTIALS_PATH_ENV) {
            return Ok(Self::at(path));
        }
        let config_dir = dirs::config_dir().ok_or_else(|| {
            MotionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine config directory",
            ))
        })?;
        Ok(Self::at(config_dir.join("motionframe").join("credentials.json")))
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored key. A missing file or entry is `Ok(None)`.
    pub fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = self.read_file()?;
        Ok(file
            .entries
            .get(CREDENTIAL_ENTRY)
            .and_then(|key| Credential::new(key.as_str()).ok()))
    }

    /// Stored key, falling back to the `GOOGLE_API_KEY` env var.
    pub fn resolve(&self) -> Result<Option<Credential>> {
        if let Some(credential) = self.load()? {
            return Ok(Some(credential));
        }
        Ok(std::env::var(API_KEY_ENV)
            .ok()
            .and_then(|key| Credential::new(key).ok()))
    }

    /// Writes the key, creating parent directories as needed.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let mut file = if self.path.exists() {
            self.read_file()?
        } else {
            StoreFile::default()
        };
        file.entries
            .insert(CREDENTIAL_ENTRY.to_string(), credential.expose().to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        restrict_permissions(&self.path)?;
        tracing::debug!(path = %self.path.display(), "saved API key");
        Ok(())
    }

    /// Removes the entry. Returns true if a key was stored.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let mut file = self.read_file()?;
        let removed = file.entries.remove(CREDENTIAL_ENTRY).is_some();
        if file.entries.is_empty() {
            fs::remove_file(&self.path)?;
        } else {
            fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        }
        Ok(removed)
    }

    fn read_file(&self) -> Result<StoreFile> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
