//! Per-publication citation ledgers.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use oacite_core::identifier::{ledger_file_name, publication_seed};
use tracing::{debug, info, warn};

use crate::StoreError;

/// Directory of ledger files, one `JP{publication}A.txt` per publication.
///
/// A ledger starts with the publication's own identifier and then lists the
/// canonical identifiers of its cited references, one per line. Ledgers are
/// only ever created or appended to: existing lines are never rewritten,
/// reordered, or removed, so re-running a batch is always safe.
pub struct LedgerStore {
    root: PathBuf,
}

/// What a [`LedgerStore::merge`] call wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Identifiers appended, in the order they were written.
    pub appended: Vec<String>,
}

impl MergeOutcome {
    pub fn is_noop(&self) -> bool {
        self.appended.is_empty()
    }
}

impl LedgerStore {
    /// Open a ledger directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Open an existing ledger directory without creating anything.
    pub fn open_existing(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::MissingRoot(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the ledger for `publication_number`.
    pub fn path_for(&self, publication_number: &str) -> Result<PathBuf, StoreError> {
        let trimmed = publication_number.trim();
        if trimmed.is_empty()
            || trimmed.contains(['/', '\\'])
            || trimmed == "."
            || trimmed == ".."
        {
            return Err(StoreError::InvalidPublication(publication_number.to_string()));
        }
        Ok(self.root.join(ledger_file_name(trimmed)))
    }

    // ── Writes ──

    /// Create the ledger with its seed line unless it already exists.
    ///
    /// A non-empty ledger is left byte-for-byte untouched. An empty one (left
    /// by an interrupted seed write) gets its seed line.
    pub fn ensure_ledger(&self, publication_number: &str) -> Result<PathBuf, StoreError> {
        let path = self.path_for(publication_number)?;
        let seed = publication_seed(publication_number.trim());
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                if let Err(e) = write_seed(file, &seed) {
                    // Never leave a seedless ledger behind.
                    let _ = fs::remove_file(&path);
                    return Err(StoreError::io(&path, e));
                }
                info!(path = %path.display(), "created ledger");
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let len = fs::metadata(&path)
                    .map_err(|e| StoreError::io(&path, e))?
                    .len();
                if len == 0 {
                    warn!(path = %path.display(), "empty ledger, writing seed");
                    let file = OpenOptions::new()
                        .append(true)
                        .open(&path)
                        .map_err(|e| StoreError::io(&path, e))?;
                    write_seed(file, &seed).map_err(|e| StoreError::io(&path, e))?;
                } else {
                    debug!(path = %path.display(), "ledger already exists");
                }
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        }
        Ok(path)
    }

    /// Append the candidates not yet in the ledger.
    ///
    /// Comparison is exact equality of trimmed lines. Candidates keep their
    /// relative order; a candidate repeated within `candidates` is written once.
    pub fn merge(
        &self,
        publication_number: &str,
        candidates: &[String],
    ) -> Result<MergeOutcome, StoreError> {
        let path = self.ensure_ledger(publication_number)?;
        if candidates.is_empty() {
            info!(path = %path.display(), "no candidates to merge");
            return Ok(MergeOutcome::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let mut seen: HashSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let appended: Vec<String> = candidates
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .filter(|c| seen.insert((*c).to_string()))
            .map(str::to_string)
            .collect();

        if appended.is_empty() {
            info!(path = %path.display(), "no new citations");
            return Ok(MergeOutcome::default());
        }

        let mut buf = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            buf.push('\n');
        }
        for id in &appended {
            buf.push_str(id);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(buf.as_bytes())
            .map_err(|e| StoreError::io(&path, e))?;

        info!(count = appended.len(), path = %path.display(), "appended citations");
        Ok(MergeOutcome { appended })
    }

    // ── Reads ──

    /// Non-blank lines of a ledger, trimmed. Empty if the ledger does not exist.
    pub fn read(&self, publication_number: &str) -> Result<Vec<String>, StoreError> {
        let path = self.path_for(publication_number)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

fn write_seed(mut file: File, seed: &str) -> std::io::Result<()> {
    writeln!(file, "{seed}")?;
    file.sync_data()
}
