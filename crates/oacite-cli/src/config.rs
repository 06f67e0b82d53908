//! Secrets for a run: patent-office login, oracle API key, optional proxy.
//!
//! Values come from flags/environment first and fall back to a JSON
//! credential store. Whatever was resolved is written back to the store so the
//! next run needs no flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use oacite_sync::Credentials;
use serde::{Deserialize, Serialize};
use tracing::info;

/// On-disk shape of the credential store.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub jpo_user: String,
    #[serde(default)]
    pub jpo_password: String,
    #[serde(default)]
    pub oracle_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("jpo_user", &self.jpo_user)
            .field("proxy_configured", &self.proxy.is_some())
            .finish_non_exhaustive()
    }
}

/// Values given on the command line or in the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub jpo_user: Option<String>,
    pub jpo_password: Option<String>,
    pub oracle_key: Option<String>,
    pub proxy: Option<String>,
}

/// Everything a run needs to authenticate.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub jpo: Credentials,
    pub oracle_key: String,
    pub proxy: Option<String>,
}

pub trait CredentialStore {
    fn load(&self) -> anyhow::Result<StoredCredentials>;
    fn save(&self, credentials: &StoredCredentials) -> anyhow::Result<()>;
}

/// Credential store kept as a JSON file.
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/oacite/credentials.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("oacite").join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for JsonCredentialStore {
    fn load(&self) -> anyhow::Result<StoredCredentials> {
        if !self.path.exists() {
            return Ok(StoredCredentials::default());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn save(&self, credentials: &StoredCredentials) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        info!(path = %self.path.display(), "saved credentials");
        Ok(())
    }
}

fn pick(over: Option<String>, stored: String) -> String {
    over.filter(|v| !v.trim().is_empty()).unwrap_or(stored)
}

/// Merge overrides onto the stored values, persist the result, and check completeness.
pub fn resolve(store: &dyn CredentialStore, overrides: Overrides) -> anyhow::Result<Secrets> {
    let stored = store.load()?;
    let merged = StoredCredentials {
        jpo_user: pick(overrides.jpo_user, stored.jpo_user.clone()),
        jpo_password: pick(overrides.jpo_password, stored.jpo_password.clone()),
        oracle_key: pick(overrides.oracle_key, stored.oracle_key.clone()),
        proxy: overrides
            .proxy
            .filter(|p| !p.trim().is_empty())
            .or_else(|| stored.proxy.clone()),
    };

    let mut missing = Vec::new();
    if merged.jpo_user.trim().is_empty() {
        missing.push("--jpo-user / OACITE_JPO_USER");
    }
    if merged.jpo_password.trim().is_empty() {
        missing.push("--jpo-password / OACITE_JPO_PASSWORD");
    }
    if merged.oracle_key.trim().is_empty() {
        missing.push("--oracle-key / OACITE_ORACLE_KEY");
    }
    if !missing.is_empty() {
        bail!("missing credentials: {}", missing.join(", "));
    }

    if merged != stored {
        store.save(&merged)?;
    }

    Ok(Secrets {
        jpo: Credentials::new(merged.jpo_user, merged.jpo_password),
        oracle_key: merged.oracle_key,
        proxy: merged.proxy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full() -> StoredCredentials {
        StoredCredentials {
            jpo_user: "user".into(),
            jpo_password: "pw".into(),
            oracle_key: "sk-1".into(),
            proxy: None,
        }
    }

    #[test]
    fn load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonCredentialStore::at(tmp.path().join("none.json"));
        assert_eq!(store.load().unwrap(), StoredCredentials::default());
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = JsonCredentialStore::at(tmp.path().join("nested").join("c.json"));
        let creds = StoredCredentials {
            proxy: Some("http://proxy:8080".into()),
            ..full()
        };
        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), creds);
    }

    #[test]
    fn resolve_prefers_overrides_and_persists() {
        let tmp = TempDir::new().unwrap();
        let store = JsonCredentialStore::at(tmp.path().join("c.json"));
        store.save(&full()).unwrap();

        let secrets = resolve(
            &store,
            Overrides {
                oracle_key: Some("sk-2".into()),
                jpo_user: Some("  ".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(secrets.jpo.username, "user");
        assert_eq!(secrets.jpo.password, "pw");
        assert_eq!(secrets.oracle_key, "sk-2");
        assert_eq!(store.load().unwrap().oracle_key, "sk-2");
    }

    #[test]
    fn resolve_reports_every_missing_field() {
        let tmp = TempDir::new().unwrap();
        let store = JsonCredentialStore::at(tmp.path().join("c.json"));
        let err = resolve(
            &store,
            Overrides {
                jpo_user: Some("user".into()),
                ..Default::default()
            },
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("OACITE_JPO_PASSWORD"));
        assert!(err.contains("OACITE_ORACLE_KEY"));
        assert!(!err.contains("OACITE_JPO_USER"));
        assert!(!store.path().exists());
    }

    #[test]
    fn debug_hides_secrets() {
        let rendered = format!("{:?}", full());
        assert!(!rendered.contains("pw"));
        assert!(!rendered.contains("sk-1"));
    }
}
