//! The parsed device response as handed over by the verification library.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::document_type::{DocType, NameSpace};

pub type ClaimKey = String;
pub type NamespacedClaims = Vec<(NameSpace, Vec<(ClaimKey, ciborium::Value)>)>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub documents: Vec<ResponseDocument>,
    /// Validity records, keyed by doc type.
    pub validity: BTreeMap<DocType, DocumentValidity>,
}

/// One document of a device response. Namespaces and the claims within them
/// keep the order in which the holder listed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDocument {
    pub doc_type: DocType,
    pub namespaces: NamespacedClaims,
}

/// Result of the library's signature and integrity checks for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentValidity {
    pub device_signature_valid: bool,
    pub issuer_signature_valid: bool,
    pub data_integrity_intact: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub signed: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub valid_from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub valid_until: Option<OffsetDateTime>,
}

impl DeviceResponse {
    pub fn validity_for(&self, doc_type: &str) -> Option<&DocumentValidity> {
        self.validity.get(doc_type)
    }
}

impl DocumentValidity {
    /// All signatures verified, digests matched and, when present, `at` lies
    /// within the validity window.
    pub fn is_valid(&self, at: OffsetDateTime) -> bool {
        let in_window = self.valid_from.map_or(true, |from| from <= at)
            && self.valid_until.map_or(true, |until| at <= until);
        self.device_signature_valid
            && self.issuer_signature_valid
            && self.data_integrity_intact
            && in_window
    }
}
