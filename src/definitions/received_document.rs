use std::ops::Index;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::device_response::{ClaimKey, DocumentValidity};
use super::document_type::DocumentType;

/// A claim value ready to be shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ClaimValue {
    Text(String),
    /// Encoded image data, e.g. a JPEG portrait.
    Image(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Bytes with no textual rendering.
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
}

impl ClaimValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Claims in display order.
///
/// Keys are unique. Inserting a key that is already present replaces its value
/// and keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Vec<(ClaimKey, ClaimValue)>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value previously stored under `key`.
    pub fn insert(&mut self, key: ClaimKey, value: ClaimValue) -> Option<ClaimValue> {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ClaimValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<&str> for Claims {
    type Output = ClaimValue;

    fn index(&self, key: &str) -> &ClaimValue {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no claim named {key}"),
        }
    }
}

impl FromIterator<(ClaimKey, ClaimValue)> for Claims {
    fn from_iter<I: IntoIterator<Item = (ClaimKey, ClaimValue)>>(iter: I) -> Self {
        let mut claims = Self::new();
        for (key, value) in iter {
            claims.insert(key, value);
        }
        claims
    }
}

impl IntoIterator for Claims {
    type Item = (ClaimKey, ClaimValue);
    type IntoIter = std::vec::IntoIter<(ClaimKey, ClaimValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A document received from the holder, after trust evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedDocument {
    pub id: Uuid,
    pub document_type: DocumentType,
    pub trusted: bool,
    pub claims: Claims,
    pub validity: DocumentValidity,
}
