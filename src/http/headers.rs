use std::collections::HashMap;

use crate::http::parser::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Case-insensitive header map.
///
/// Names are stored lower-cased. Setting a name that already holds a value
/// appends the new value as `", <value>"`, so repeated headers keep their
/// arrival order in the merged value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses at most one header line from the front of `data`.
    ///
    /// Returns `(consumed, done)`:
    /// - `(0, false)` when no full line is buffered yet (need more data),
    /// - `(2, true)` when the line is empty, i.e. the header block ended,
    /// - `(line + 2, false)` after storing one header.
    pub fn parse_line(&mut self, data: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(idx) = find_crlf(data) else {
            return Ok((0, false));
        };

        if idx == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = &data[..idx];
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or(ParseError::InvalidHeaderFormat)?;
        let (name, value) = (&line[..colon], &line[colon + 1..]);

        // whitespace is only allowed before the name, never between it and the colon
        let name = name.trim_ascii_start();
        if name.iter().any(|&b| b == b' ' || b == b'\t') {
            return Err(ParseError::InvalidHeaderFormat);
        }

        if !is_token(name) {
            return Err(ParseError::DisallowedHeaderCharacters);
        }

        // obs-text values (bytes 0x80..=0xFF) are kept, not rejected
        let value = String::from_utf8_lossy(value.trim_ascii());
        self.set(&String::from_utf8_lossy(name), &value);

        Ok((idx + CRLF.len(), false))
    }

    /// Stores `value` under the lower-cased `name`, merging with any existing value.
    pub fn set(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(existing) if !existing.is_empty() => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                self.entries.insert(key, value.to_string());
            }
        }
    }

    /// Stores `value` under `name`, dropping any previous value.
    pub fn replace(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(lower-cased name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

/// HTTP token characters: letters, digits and ``! # $ % & ' * + - . ^ _ ` | ~``.
fn is_token(name: &[u8]) -> bool {
    !name.is_empty()
        && name.iter().all(|&b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

/// Renders a stored (lower-cased) name in its conventional wire form,
/// e.g. `content-type` becomes `Content-Type`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}
