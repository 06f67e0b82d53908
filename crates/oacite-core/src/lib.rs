pub mod document;
pub mod entry;
pub mod extract;
pub mod identifier;

pub use document::StructuredDocument;
pub use entry::{Entry, EntryError, load_entries_csv};
pub use extract::{CitationSegment, SegmentMarkers, extract, extract_with};
pub use identifier::{ledger_file_name, looks_canonical, publication_seed};
