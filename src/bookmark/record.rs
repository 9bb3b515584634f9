//! Bookmark records and their query-string form
//!
//! Inline records embed the inputs directly:
//! `?_inputs_&damping=1&delta=1&_values_&note=%22x%22`
//!
//! Reference records only carry the id of a stored state:
//! `?_state_id_=5f2c9a01b7e4d3c8`

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::error::BookmarkError;
use super::snapshot::{InputSnapshot, StateValues};
use super::value::InputValue;

pub const INPUTS_MARKER: &str = "_inputs_";
pub const VALUES_MARKER: &str = "_values_";
pub const STATE_ID_KEY: &str = "_state_id_";

const MAX_STATE_ID_LEN: usize = 64;

/// Opaque token naming a stored state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateId(String);

impl StateId {
    /// Draw a fresh 16 hex character id.
    pub fn generate() -> Self {
        let bits: u64 = rand::rng().random();
        Self(format!("{:016x}", bits))
    }

    /// Validate an incoming id.
    ///
    /// Ids become path components in file-backed stores, so only
    /// `[A-Za-z0-9_-]` is accepted.
    pub fn parse(raw: &str) -> Result<Self, BookmarkError> {
        if raw.is_empty() || raw.len() > MAX_STATE_ID_LEN {
            return Err(BookmarkError::parse(format!(
                "state id must be 1-{} characters",
                MAX_STATE_ID_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(BookmarkError::parse(format!("invalid state id '{}'", raw)));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StateId {
    type Error = BookmarkError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<StateId> for String {
    fn from(id: StateId) -> Self {
        id.0
    }
}

/// Inputs and manual values encoded as `(key, canonical text)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineRecord {
    inputs: Vec<(String, String)>,
    values: Vec<(String, String)>,
}

impl InlineRecord {
    /// Encode a snapshot and its manual values.
    ///
    /// Fails on the first value without a URL-safe form.
    pub fn encode(inputs: &InputSnapshot, values: &StateValues) -> Result<Self, BookmarkError> {
        Ok(Self {
            inputs: encode_pairs(inputs.iter())?,
            values: encode_pairs(values.iter())?,
        })
    }

    pub fn decode(&self) -> Result<(InputSnapshot, StateValues), BookmarkError> {
        let inputs = decode_pairs(&self.inputs)?.into_iter().collect();
        let values = decode_pairs(&self.values)?.into_iter().collect();
        Ok((inputs, values))
    }

    pub fn input_ids(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|(k, _)| k.as_str())
    }
}

fn encode_pairs<'a>(
    pairs: impl Iterator<Item = (&'a String, &'a InputValue)>,
) -> Result<Vec<(String, String)>, BookmarkError> {
    pairs
        .map(|(id, value)| {
            value
                .to_canonical()
                .map(|text| (id.clone(), text))
                .map_err(|reason| BookmarkError::Unencodable {
                    input: id.clone(),
                    reason,
                })
        })
        .collect()
}

fn decode_pairs(pairs: &[(String, String)]) -> Result<Vec<(String, InputValue)>, BookmarkError> {
    pairs
        .iter()
        .map(|(id, text)| {
            InputValue::from_canonical(text)
                .map(|value| (id.clone(), value))
                .map_err(|e| {
                    BookmarkError::parse(format!("failed to parse value of '{}': {}", id, e))
                })
        })
        .collect()
}

/// A persisted reference to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkRecord {
    Inline(InlineRecord),
    Reference(StateId),
}

#[derive(Clone, Copy)]
enum Section {
    Foreign,
    Inputs,
    Values,
}

impl BookmarkRecord {
    /// Parse a bookmark out of a query string (with or without the leading `?`).
    ///
    /// Returns `Ok(None)` when the query carries no bookmark marker.
    pub fn from_query(query: &str) -> Result<Option<Self>, BookmarkError> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut section = Section::Foreign;
        let mut saw_inline = false;
        let mut state_id: Option<String> = None;
        let mut record = InlineRecord::default();
        let mut seen_inputs = HashSet::new();
        let mut seen_values = HashSet::new();

        for segment in query.split('&').filter(|s| !s.is_empty()) {
            let (key, value) = match decode_segment(segment) {
                Ok(pair) => pair,
                Err(_) if matches!(section, Section::Foreign) => continue,
                Err(e) => return Err(e),
            };

            if !segment.contains('=') {
                match key.as_str() {
                    INPUTS_MARKER => {
                        section = Section::Inputs;
                        saw_inline = true;
                    }
                    VALUES_MARKER => {
                        section = Section::Values;
                        saw_inline = true;
                    }
                    _ if matches!(section, Section::Foreign) => {}
                    _ => {
                        return Err(BookmarkError::parse(format!(
                            "missing value for '{}'",
                            key
                        )))
                    }
                }
                continue;
            }

            // Inside a section every pair is data, even one named `_state_id_`
            let (pairs, seen) = match section {
                Section::Foreign => {
                    if key == STATE_ID_KEY && state_id.replace(value).is_some() {
                        return Err(BookmarkError::parse("duplicate _state_id_"));
                    }
                    continue;
                }
                Section::Inputs => (&mut record.inputs, &mut seen_inputs),
                Section::Values => (&mut record.values, &mut seen_values),
            };
            if !seen.insert(key.clone()) {
                return Err(BookmarkError::parse(format!("duplicate key '{}'", key)));
            }
            pairs.push((key, value));
        }

        match (state_id, saw_inline) {
            (Some(_), true) => Err(BookmarkError::parse(
                "_state_id_ cannot be combined with _inputs_ or _values_",
            )),
            (Some(id), false) => Ok(Some(Self::Reference(StateId::parse(&id)?))),
            (None, true) => Ok(Some(Self::Inline(record))),
            (None, false) => Ok(None),
        }
    }

    /// Canonical query string, including the leading `?`.
    pub fn to_query(&self) -> String {
        match self {
            Self::Reference(id) => format!("?{}={}", STATE_ID_KEY, id),
            Self::Inline(record) => {
                let mut query = format!("?{}", INPUTS_MARKER);
                push_pairs(&mut query, &record.inputs);
                if !record.values.is_empty() {
                    query.push('&');
                    query.push_str(VALUES_MARKER);
                    push_pairs(&mut query, &record.values);
                }
                query
            }
        }
    }

    /// Attach the query to a base URL, replacing any query it already has.
    pub fn to_url(&self, base: &str) -> String {
        let base = base.split(['?', '#']).next().unwrap_or(base);
        format!("{}{}", base, self.to_query())
    }

    pub fn state_id(&self) -> Option<&StateId> {
        match self {
            Self::Reference(id) => Some(id),
            Self::Inline(_) => None,
        }
    }
}

impl fmt::Display for BookmarkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

fn push_pairs(query: &mut String, pairs: &[(String, String)]) {
    for (key, value) in pairs {
        query.push('&');
        query.extend(form_urlencoded::byte_serialize(key.as_bytes()));
        query.push('=');
        query.extend(form_urlencoded::byte_serialize(value.as_bytes()));
    }
}

fn decode_segment(segment: &str) -> Result<(String, String), BookmarkError> {
    let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
    Ok((decode_component(key)?, decode_component(value)?))
}

/// Form-urlencoded decoding that rejects escapes which are not UTF-8.
fn decode_component(raw: &str) -> Result<String, BookmarkError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match raw
                .get(i + 1..i + 3)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .map(|hex| u8::from_str_radix(hex, 16))
            {
                Some(Ok(byte)) => {
                    out.push(byte);
                    i += 2;
                }
                // Malformed escapes pass through as written
                _ => out.push(b'%'),
            },
            byte => out.push(byte),
        }
        i += 1;
    }
    String::from_utf8(out)
        .map_err(|_| BookmarkError::parse(format!("'{}' does not decode to UTF-8", raw)))
}
