//! Decoding of retrieved notice documents.
//!
//! Notice XML declares its own encoding (`<?xml ... encoding="Shift_JIS"?>`).
//! The declaration is looked up in the first [`DECLARATION_WINDOW`] bytes and
//! honoured; `Shift_JIS` is read as Windows-31J, which is what the office
//! actually emits. Decoding never fails: bytes that are invalid in the chosen
//! encoding come out as U+FFFD.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use tracing::{debug, warn};

/// How far into a document the encoding declaration is searched for.
pub const DECLARATION_WINDOW: usize = 300;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)encoding\s*=\s*["']([^"']+)["']"#).expect("valid declaration regex")
});

/// Text of one retrieved document, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredDocument {
    /// File name inside the retrieved package.
    pub name: String,
    /// Name of the encoding the text was decoded with.
    pub encoding: String,
    pub text: String,
}

impl StructuredDocument {
    /// Build a document from text that is already decoded.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoding: UTF_8.name().to_string(),
            text: text.into(),
        }
    }

    /// Decode raw bytes using the encoding the document declares.
    pub fn decode(name: impl Into<String>, raw: &[u8]) -> Self {
        let name = name.into();
        let encoding = declared_encoding(raw)
            .map(|label| resolve_encoding(&label))
            .unwrap_or(UTF_8);

        let (text, used, had_errors) = encoding.decode(raw);
        if had_errors {
            warn!(document = %name, encoding = used.name(), "undecodable bytes replaced");
        } else {
            debug!(document = %name, encoding = used.name(), "decoded document");
        }

        Self {
            name,
            encoding: used.name().to_string(),
            text: text.into_owned(),
        }
    }
}

/// The encoding label declared near the start of `raw`, if any.
pub fn declared_encoding(raw: &[u8]) -> Option<String> {
    let head = &raw[..raw.len().min(DECLARATION_WINDOW)];
    let caps = DECLARATION.captures(head)?;
    let label = caps.get(1)?.as_bytes();
    Some(String::from_utf8_lossy(label).into_owned())
}

/// Map a declared label to an encoding, falling back to UTF-8 for unknown labels.
pub fn resolve_encoding(label: &str) -> &'static Encoding {
    let label = label
        .trim()
        .to_ascii_lowercase()
        .replace("shift_jis", "windows-31j");
    Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
        warn!(label = %label, "unknown encoding label, using UTF-8");
        UTF_8
    })
}
