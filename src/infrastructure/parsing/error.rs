//! Errors raised while building an extractor
//!
//! Extraction itself never fails; only a broken markup contract (an
//! unparsable selector or root URL) is reported, and only at construction.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
