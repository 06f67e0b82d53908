//! Cited-reference segment extraction.
//!
//! A rejection notice lists its citations under the `引用文献等一覧` heading and
//! follows them with the `先行技術文献調査結果の記録` heading. Everything after
//! the first occurrence of the opening heading, up to the first closing
//! heading after it (or the end of the document), is one document's
//! contribution. Contributions from all documents of an application are
//! joined with `\n` in delivery order.
//!
//! `None` means no document carried the opening heading at all. A segment
//! that was found but is blank is returned as `Some` so the two cases stay
//! distinguishable in logs.

use crate::document::StructuredDocument;

/// Heading that opens the cited-reference list.
pub const OPEN_MARKER: &str = "引用文献等一覧";
/// Heading of the prior-art search record that follows the list.
pub const CLOSE_MARKER: &str = "先行技術文献調査結果の記録";

/// Literal headings bounding the citation region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMarkers {
    pub open: String,
    pub close: String,
}

impl Default for SegmentMarkers {
    fn default() -> Self {
        Self {
            open: OPEN_MARKER.to_string(),
            close: CLOSE_MARKER.to_string(),
        }
    }
}

/// Concatenated citation regions of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSegment {
    pub text: String,
    /// Number of documents that contributed a region.
    pub sources: usize,
}

impl CitationSegment {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// The region of a single text bounded by `markers`, if the opening marker occurs.
pub fn region<'a>(text: &'a str, markers: &SegmentMarkers) -> Option<&'a str> {
    let start = text.find(markers.open.as_str())? + markers.open.len();
    let rest = &text[start..];
    match rest.find(markers.close.as_str()) {
        Some(end) => Some(&rest[..end]),
        None => Some(rest),
    }
}

/// Extract with the default JPO headings.
pub fn extract(documents: &[StructuredDocument]) -> Option<CitationSegment> {
    extract_with(&SegmentMarkers::default(), documents)
}

pub fn extract_with(
    markers: &SegmentMarkers,
    documents: &[StructuredDocument],
) -> Option<CitationSegment> {
    let parts: Vec<&str> = documents
        .iter()
        .filter_map(|doc| region(&doc.text, markers))
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(CitationSegment {
        text: parts.join("\n"),
        sources: parts.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> StructuredDocument {
        StructuredDocument::from_text("doc.xml", text)
    }

    #[test]
    fn both_markers_bound_the_region() {
        let docs = [doc(
            "前文＜引用文献等一覧＞\n１．特開２０１４－１７８９２８号公報\n＜先行技術文献調査結果の記録＞後文",
        )];
        let seg = extract(&docs).unwrap();
        assert_eq!(seg.text, "＞\n１．特開２０１４－１７８９２８号公報\n＜");
        assert!(!seg.text.contains("前文"));
        assert!(!seg.text.contains("後文"));
        assert!(!seg.text.contains(CLOSE_MARKER));
        assert_eq!(seg.sources, 1);
    }

    #[test]
    fn open_marker_only_runs_to_end() {
        let docs = [doc("head 引用文献等一覧 1. cited text to the end")];
        let seg = extract(&docs).unwrap();
        assert_eq!(seg.text, " 1. cited text to the end");
    }

    #[test]
    fn close_marker_before_open_is_ignored() {
        let docs = [doc("先行技術文献調査結果の記録 x 引用文献等一覧 y")];
        assert_eq!(extract(&docs).unwrap().text, " y");
    }

    #[test]
    fn no_marker_anywhere_is_none() {
        let docs = [doc("nothing relevant"), doc("still nothing")];
        assert_eq!(extract(&docs), None);
        assert_eq!(extract(&[]), None);
    }

    #[test]
    fn blank_region_is_some_but_blank() {
        let docs = [doc("引用文献等一覧 \n 先行技術文献調査結果の記録")];
        let seg = extract(&docs).unwrap();
        assert!(seg.is_blank());
    }

    #[test]
    fn contributions_joined_in_delivery_order() {
        let docs = [
            doc("引用文献等一覧A先行技術文献調査結果の記録"),
            doc("no heading here"),
            doc("引用文献等一覧B"),
        ];
        let seg = extract(&docs).unwrap();
        assert_eq!(seg.text, "A\nB");
        assert_eq!(seg.sources, 2);
    }

    #[test]
    fn custom_markers() {
        let markers = SegmentMarkers {
            open: "list of cited references".into(),
            close: "prior-art search record".into(),
        };
        let docs = [doc(
            "x list of cited references\n1. examined citation text\nprior-art search record y",
        )];
        let seg = extract_with(&markers, &docs).unwrap();
        assert_eq!(seg.text, "\n1. examined citation text\n");
    }
}
