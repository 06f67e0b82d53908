//! AI layer: the text-completion oracle that rewrites free-text citations
//! into canonical identifiers.

mod chat;
mod normalize;
mod oracle;

pub use chat::{ChatCompletionClient, DEFAULT_CHAT_ENDPOINT, DEFAULT_MODEL};
pub use normalize::{
    MAX_SEGMENT_CHARS, NORMALIZATION_PROMPT, normalize, normalize_text, parse_identifiers,
    truncate_segment,
};
pub use oracle::{Oracle, OracleError};
