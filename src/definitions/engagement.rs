//! Validation of scanned proximity engagement codes.
use serde::{Deserialize, Serialize};

pub const ENGAGEMENT_PREFIX: &str = "mdoc:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("engagement code does not start with '{ENGAGEMENT_PREFIX}'")]
    InvalidPrefix,
    #[error("engagement code has no payload")]
    Empty,
}

/// A scanned code that passed the prefix check and may be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngagementCode(String);

impl EngagementCode {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let text = text.trim();
        let Some(prefix) = text.get(..ENGAGEMENT_PREFIX.len()) else {
            return Err(Error::InvalidPrefix);
        };
        if !prefix.eq_ignore_ascii_case(ENGAGEMENT_PREFIX) {
            return Err(Error::InvalidPrefix);
        }
        if text.len() == ENGAGEMENT_PREFIX.len() {
            return Err(Error::Empty);
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The encoded device engagement following the prefix.
    pub fn payload(&self) -> &str {
        &self.0[ENGAGEMENT_PREFIX.len()..]
    }
}

impl TryFrom<String> for EngagementCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        Self::parse(&value)
    }
}

impl From<EngagementCode> for String {
    fn from(code: EngagementCode) -> String {
        code.0
    }
}

impl std::fmt::Display for EngagementCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
