//! Mention text normalization.
//!
//! Slack delivers `app_mention` text prefixed with the bot's mention marker,
//! e.g. `<@U0123ABCD> ping`. [`normalize`] strips the marker and folds the
//! remainder into the form the [`ResponseMatcher`](crate::ResponseMatcher)
//! matches against.

use std::fmt;

use crate::error::ParseError;

/// Mention text with the marker removed, trimmed, and ASCII-lowercased.
///
/// Only [`normalize`] constructs values of this type, so a
/// `NormalizedMessage` never contains the mention marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedMessage(String);

impl NormalizedMessage {
    /// Returns the normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of Unicode code points in the text.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl AsRef<str> for NormalizedMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes raw mention text.
///
/// Everything up to and including the first `>` is dropped. The rest is
/// trimmed of Unicode whitespace (so the ideographic space U+3000 goes too)
/// and lowercased for ASCII letters only; full-width Latin letters keep
/// their case.
///
/// # Errors
///
/// Returns `ParseError::Malformed` if the text has no `>`, i.e. no mention
/// marker to strip.
///
/// # Examples
///
/// ```
/// use poh_core::normalize;
///
/// let msg = normalize("<@U0123ABCD>  Ping ").unwrap();
/// assert_eq!(msg.as_str(), "ping");
/// ```
pub fn normalize(text: &str) -> Result<NormalizedMessage, ParseError> {
    let Some((_, rest)) = text.split_once('>') else {
        return Err(ParseError::Malformed(
            "mention text has no '>' terminated marker".into(),
        ));
    };
    Ok(NormalizedMessage(rest.trim().to_ascii_lowercase()))
}

#[cfg(test)]
pub(crate) fn normalized(text: &str) -> NormalizedMessage {
    NormalizedMessage(text.to_string())
}
