//! Locating JSON payloads embedded in non-JSON page text.
//!
//! A [Sentinel] finds the span, a decode step (for example
//! [unescape_embedded]) turns it into parseable JSON. The two are kept apart
//! so each can be tested on its own.

use regex::Regex;

use crate::error::{KanshiError, KanshiResult};

pub struct Sentinel {
    name: &'static str,
    regex: Regex,
}

impl Sentinel {
    /// `pattern` must contain one capture group around the payload.
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
        })
    }

    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|payload| payload.as_str())
    }

    /// Like [Sentinel::find], but a missing marker is a [KanshiError::ParseFailed].
    pub fn extract<'t>(&self, text: &'t str) -> KanshiResult<&'t str> {
        self.find(text)
            .ok_or_else(|| KanshiError::ParseFailed(format!("{} not found", self.name)))
    }
}

/// Undo the escaping of JSON that was itself embedded in a JS string literal:
/// backslashes are dropped and hex-escaped ampersands restored.
pub fn unescape_embedded(payload: &str) -> String {
    payload.replace('\\', "").replace("u0026", "&")
}
