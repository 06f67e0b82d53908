//! Free-text citation → canonical identifier normalization.
//!
//! The rewriting itself is done by the oracle under [`NORMALIZATION_PROMPT`].
//! This module bounds the input, short-circuits blank segments, and splits
//! the reply into candidate identifiers. Replies are not checked against the
//! identifier shape here; the ledger records what the oracle produced.

use oacite_core::CitationSegment;
use tracing::{debug, info};

use crate::oracle::{Oracle, OracleError};

/// Characters of a segment sent to the oracle. Only the head is kept.
pub const MAX_SEGMENT_CHARS: usize = 12_000;

/// System instruction for the oracle.
pub const NORMALIZATION_PROMPT: &str = "\
You are an experienced patent examiner at the Japan Patent Office.

The user message is the cited-reference list of a notice of reasons for refusal.
Extract only the publication, registration, or application-publication numbers
of the cited documents and rewrite each one as:

  <ISO 3166-1 alpha-2 country code><4-digit Gregorian year><serial number><kind code>

The serial number is the 6 to 7 digit number of the document.

Rules:
1. Convert every Japanese era year (Showa, Heisei, Reiwa) to the Gregorian year.
2. Published applications end in A, granted/registered publications end in B.
3. Utility models always end in U, in preference to any other kind code.
4. Emit exactly one kind-code letter. Offices whose numbers carry a publication-kind
   digit after the letter keep it (e.g. A1).
5. International (PCT, WO) publications get no kind code.
6. If there are no qualifying references, output nothing at all.

Examples:
  「２．特開平１－４７８８０号公報（特に、特許請求の範囲,第2頁右上欄第7-12行、参照）」 -> JP198947880A
  「１．米国特許出願公開第２０１５／０１８３０８３号明細書」 -> US20150183083A1
  「５．国際公開第２０１７／０１８０１６号（周知技術を示す文献）」 -> WO2017018016
  「１．特開平５－１７８２６８号公報」 -> JP1993178268A
  「２．実願昭５８－１６７９９５号（実開昭６０－７５１９８号）のマイクロフィルム」 -> JP1985075198U
  「２．特開平１１－２０７７５号公報」 -> JP199920775A
  「１．特開平７－１６８９９４号公報」 -> JP1995168994A
  「１．特開２０１４－１７８９２８号公報」 -> JP2014178928A
  「２．国際公開第２０１１／０９２８１３号」 -> WO2011092813

Output one identifier per line and nothing else: no numbering, no commentary.";

/// The first [`MAX_SEGMENT_CHARS`] characters of `text`.
pub fn truncate_segment(text: &str) -> &str {
    match text.char_indices().nth(MAX_SEGMENT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Split an oracle reply into trimmed, non-blank lines.
pub fn parse_identifiers(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a citation segment. Blank segments never reach the oracle.
pub async fn normalize(
    segment: &CitationSegment,
    oracle: &dyn Oracle,
) -> Result<Vec<String>, OracleError> {
    normalize_text(segment.as_str(), oracle).await
}

pub async fn normalize_text(text: &str, oracle: &dyn Oracle) -> Result<Vec<String>, OracleError> {
    if text.trim().is_empty() {
        debug!("blank segment, oracle not called");
        return Ok(Vec::new());
    }

    let payload = truncate_segment(text);
    if payload.len() < text.len() {
        info!(
            total_chars = text.chars().count(),
            kept_chars = MAX_SEGMENT_CHARS,
            "segment truncated"
        );
    }

    let reply = oracle.complete(NORMALIZATION_PROMPT, payload).await?;
    let ids = parse_identifiers(&reply);
    info!(count = ids.len(), model = oracle.model(), "normalized citations");
    Ok(ids)
}
