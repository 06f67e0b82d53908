//! Storage layer: one append-only, de-duplicated ledger file per publication.

mod error;
pub use error::StoreError;

mod ledger;
pub use ledger::{LedgerStore, MergeOutcome};
