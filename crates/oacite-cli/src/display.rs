//! Terminal output: batch summaries, entry checks, and ledger cards.

use std::path::Path;

use oacite_core::{Entry, looks_canonical};

use crate::pipeline::{EntryOutcome, RunReport};

const MAX_LIST_ITEMS: usize = 20;

// ── Public API ──

/// Print a run report: one line per entry, then totals and any failures to re-run.
pub fn print_run_summary(report: &RunReport) {
    println!("=== Run summary ===");
    println!();

    for r in &report.entries {
        let marker = if r.outcome.is_failure() { "!" } else { " " };
        println!("{marker} {:<26} {}", r.entry.key(), r.outcome);
    }
    println!();

    let count = |pred: fn(&EntryOutcome) -> bool| {
        report.entries.iter().filter(|r| pred(&r.outcome)).count()
    };
    println!("Totals");
    println!("  {:<26} {}", "entries processed", report.entries.len());
    println!("  {:<26} {}", "citations appended", report.appended_total());
    println!(
        "  {:<26} {}",
        "ledgers updated",
        count(|o| matches!(o, EntryOutcome::Appended(_)))
    );
    println!(
        "  {:<26} {}",
        "nothing to record",
        count(|o| !o.is_failure() && !matches!(o, EntryOutcome::Appended(_)))
    );
    println!("  {:<26} {}", "failed", count(EntryOutcome::is_failure));
    println!();

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("Re-run these entries");
        for r in failures {
            println!(
                "  {:<26} application {}, publication {}",
                r.entry.local_id, r.entry.application_number, r.entry.publication_number
            );
        }
        println!();
    }

    if let Some(reason) = &report.aborted {
        println!("Batch aborted");
        println!("  {reason}");
        println!();
    }
}

/// Print the entries parsed from an entry file without touching the network.
pub fn print_entries(source: &Path, entries: &[Entry]) {
    println!("=== {} ===", source.display());
    println!("{} entries", entries.len());
    println!();

    println!("  {:<12} {:<16} {:<16} ledger", "local id", "application", "publication");
    for e in entries.iter().take(MAX_LIST_ITEMS) {
        println!(
            "  {:<12} {:<16} {:<16} {}",
            e.local_id,
            e.application_number,
            e.publication_number,
            oacite_core::ledger_file_name(&e.publication_number)
        );
    }
    if entries.len() > MAX_LIST_ITEMS {
        println!("  ... and {} more", entries.len() - MAX_LIST_ITEMS);
    }
}

/// Print one publication's ledger as a card: seed line first, then recorded citations.
pub fn print_ledger_card(publication_number: &str, path: &Path, lines: &[String]) {
    println!("=== {} ===", oacite_core::publication_seed(publication_number));
    println!("{}", path.display());
    println!();

    let Some((seed, citations)) = lines.split_first() else {
        println!("  (no ledger yet)");
        return;
    };

    println!("Ledger");
    println!("  {:<26} {}", "seed", seed);
    println!("  {:<26} {}", "citations", citations.len());
    println!();

    if citations.is_empty() {
        return;
    }
    println!("Citations");
    for id in citations {
        if looks_canonical(id) {
            println!("  {id}");
        } else {
            println!("  {id}  (non-canonical)");
        }
    }
}
