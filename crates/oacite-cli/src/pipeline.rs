//! Batch pipeline: token check → fetch → extract → normalize → merge, one entry at a time.

use std::fmt;

use oacite_ai::{Oracle, normalize};
use oacite_core::{Entry, SegmentMarkers, extract_with, looks_canonical};
use oacite_store::LedgerStore;
use oacite_sync::{
    ArtifactFetcher, AuthError, Clock, Credentials, TokenEndpoint, TokenManager,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Only a failure to obtain the first token stops a run before it starts.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Drop oracle output that does not look like a canonical identifier
    /// instead of recording it as received.
    pub strict_identifiers: bool,
    pub markers: SegmentMarkers,
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Appended(usize),
    NothingNew,
    NoDocuments,
    NoCitationSection,
    BlankSegment,
    NoIdentifiers,
    FetchFailed(String),
    OracleFailed(String),
    StoreFailed(String),
}

impl EntryOutcome {
    /// Failures are worth re-running; the other outcomes are final for this input.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed(_) | Self::OracleFailed(_) | Self::StoreFailed(_)
        )
    }
}

impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Appended(n) => write!(f, "appended {n}"),
            Self::NothingNew => f.write_str("nothing new"),
            Self::NoDocuments => f.write_str("no documents"),
            Self::NoCitationSection => f.write_str("no citation section"),
            Self::BlankSegment => f.write_str("blank citation section"),
            Self::NoIdentifiers => f.write_str("no identifiers"),
            Self::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            Self::OracleFailed(e) => write!(f, "oracle failed: {e}"),
            Self::StoreFailed(e) => write!(f, "ledger failed: {e}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntryReport {
    pub entry: Entry,
    pub outcome: EntryOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub entries: Vec<EntryReport>,
    /// Set when the session failed mid-batch and the remaining entries were not run.
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn appended_total(&self) -> usize {
        self.entries
            .iter()
            .map(|r| match r.outcome {
                EntryOutcome::Appended(n) => n,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|r| r.outcome.is_failure())
    }
}

/// Drives entries through the pipeline with a single session token.
pub struct Orchestrator<'a, E> {
    tokens: TokenManager<E>,
    fetcher: &'a dyn ArtifactFetcher,
    oracle: &'a dyn Oracle,
    ledger: &'a LedgerStore,
    clock: &'a dyn Clock,
    options: PipelineOptions,
}

impl<'a, E: TokenEndpoint> Orchestrator<'a, E> {
    pub fn new(
        tokens: TokenManager<E>,
        fetcher: &'a dyn ArtifactFetcher,
        oracle: &'a dyn Oracle,
        ledger: &'a LedgerStore,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            tokens,
            fetcher,
            oracle,
            ledger,
            clock,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tokens(&self) -> &TokenManager<E> {
        &self.tokens
    }

    /// Process `entries` in order.
    ///
    /// Fails only if the initial token cannot be obtained. A refresh failure
    /// later stops the batch but still returns the report for entries already run.
    pub async fn run(
        &mut self,
        credentials: &Credentials,
        entries: &[Entry],
    ) -> Result<RunReport, RunError> {
        self.tokens.acquire(credentials, self.clock.now()).await?;

        let total = entries.len();
        let mut report = RunReport::default();
        for (i, entry) in entries.iter().enumerate() {
            let access_token = match self.tokens.ensure_fresh(self.clock.now()).await {
                Ok(token) => token,
                Err(e) => {
                    error!(
                        entry = %entry.key(),
                        remaining = total - i,
                        error = %e,
                        "session lost, stopping batch"
                    );
                    report.aborted = Some(format!(
                        "stopped before entry {} ({} of {total}): {e}",
                        entry.key(),
                        i + 1
                    ));
                    break;
                }
            };

            info!(entry = %entry.key(), progress = %format!("{}/{total}", i + 1), "processing entry");
            let outcome = self.process(entry, &access_token).await;
            if outcome.is_failure() {
                warn!(
                    entry = %entry.key(),
                    local_id = %entry.local_id,
                    application = %entry.application_number,
                    outcome = %outcome,
                    "entry skipped, re-run it later"
                );
            } else {
                info!(entry = %entry.key(), outcome = %outcome, "entry done");
            }
            report.entries.push(EntryReport {
                entry: entry.clone(),
                outcome,
            });
        }

        info!(
            processed = report.entries.len(),
            appended = report.appended_total(),
            "batch finished"
        );
        Ok(report)
    }

    async fn process(&self, entry: &Entry, access_token: &str) -> EntryOutcome {
        if let Err(e) = self.ledger.ensure_ledger(&entry.publication_number) {
            return EntryOutcome::StoreFailed(e.to_string());
        }

        let documents = match self
            .fetcher
            .fetch(access_token, &entry.application_number)
            .await
        {
            Ok(docs) => docs,
            Err(e) => return EntryOutcome::FetchFailed(e.to_string()),
        };
        if documents.is_empty() {
            return EntryOutcome::NoDocuments;
        }

        let Some(segment) = extract_with(&self.options.markers, &documents) else {
            debug!(entry = %entry.key(), documents = documents.len(), "no citation heading in any document");
            return EntryOutcome::NoCitationSection;
        };
        if segment.is_blank() {
            return EntryOutcome::BlankSegment;
        }

        let mut ids = match normalize(&segment, self.oracle).await {
            Ok(ids) => ids,
            Err(e) => return EntryOutcome::OracleFailed(e.to_string()),
        };
        self.screen(entry, &mut ids);
        if ids.is_empty() {
            return EntryOutcome::NoIdentifiers;
        }

        match self.ledger.merge(&entry.publication_number, &ids) {
            Ok(merged) if merged.is_noop() => EntryOutcome::NothingNew,
            Ok(merged) => EntryOutcome::Appended(merged.appended.len()),
            Err(e) => EntryOutcome::StoreFailed(e.to_string()),
        }
    }

    /// Flag (or, in strict mode, drop) oracle output that is not canonical-shaped.
    fn screen(&self, entry: &Entry, ids: &mut Vec<String>) {
        let strict = self.options.strict_identifiers;
        ids.retain(|id| {
            if looks_canonical(id) {
                return true;
            }
            warn!(entry = %entry.key(), identifier = %id, dropped = strict, "non-canonical identifier from oracle");
            !strict
        });
    }
}
