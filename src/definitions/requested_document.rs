use serde::{Deserialize, Serialize};

use super::catalog::{ClaimItem, DocumentCatalog, Mode};
use super::document_type::DocumentType;

/// A document the operator wants to request, together with the claims to ask for.
///
/// A [Mode::Full] document always carries exactly the catalog's claim list for
/// its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedDocument {
    pub id: String,
    pub document_type: DocumentType,
    pub mode: Mode,
    pub claims: Vec<ClaimItem>,
}

impl RequestedDocument {
    /// A full request for every claim the catalog lists for `document_type`.
    pub fn full(id: impl Into<String>, document_type: DocumentType, catalog: &DocumentCatalog) -> Self {
        Self {
            id: id.into(),
            document_type,
            mode: Mode::Full,
            claims: catalog.claims(document_type).to_vec(),
        }
    }

    /// A custom request with no claims selected yet.
    pub fn custom_draft(id: impl Into<String>, document_type: DocumentType) -> Self {
        Self {
            id: id.into(),
            document_type,
            mode: Mode::Custom,
            claims: Vec::new(),
        }
    }

    pub fn with_claims(mut self, claims: Vec<ClaimItem>) -> Self {
        self.claims = claims;
        self
    }
}
