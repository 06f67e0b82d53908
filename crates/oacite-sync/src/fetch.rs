//! Refusal-notice package retrieval.

use oacite_core::StructuredDocument;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid application number: {0:?}")]
    InvalidApplication(String),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[cfg(feature = "http")]
    #[error("package archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Yields the decoded documents of an application's refusal-notice package.
///
/// "Nothing available" is `Ok(vec![])`, not an error.
#[async_trait::async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(
        &self,
        access_token: &str,
        application_number: &str,
    ) -> Result<Vec<StructuredDocument>, FetchError>;
}

/// Reject application numbers that could not be a single URL or path segment.
pub fn check_application_number(application_number: &str) -> Result<&str, FetchError> {
    let trimmed = application_number.trim();
    if trimmed.is_empty()
        || trimmed.contains(['/', '\\', '?', '#'])
        || trimmed == "."
        || trimmed == ".."
    {
        return Err(FetchError::InvalidApplication(application_number.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_numbers_must_be_one_segment() {
        assert_eq!(check_application_number(" 2024147578 ").unwrap(), "2024147578");
        for bad in ["", "  ", ".", "..", "../x", "a/b", "a\\b", "1?x=2", "1#frag"] {
            assert!(
                matches!(
                    check_application_number(bad),
                    Err(FetchError::InvalidApplication(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
