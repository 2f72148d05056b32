//! Static mapping from document type to the claims and presentation modes the
//! verifier can request.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::document_type::DocumentType;

/// One requestable attribute, identified by its label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimItem {
    pub label: String,
}

impl ClaimItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl From<&str> for ClaimItem {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// How a document type is requested.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
)]
pub enum Mode {
    /// Every claim the catalog lists for the type.
    Full,
    /// An explicit subset of claims.
    Custom,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Custom => "Custom",
        }
    }
}

/// Catalog data for a single document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub claims: Vec<ClaimItem>,
    pub modes: Vec<Mode>,
}

/// A selectable row of the catalog, as presented to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOption {
    pub id: String,
    pub document_type: DocumentType,
    pub display_name: String,
    pub modes: Vec<Mode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCatalog {
    entries: BTreeMap<DocumentType, CatalogEntry>,
}

const PID_CLAIMS: &[&str] = &[
    "family_name",
    "given_name",
    "birth_date",
    "age_over_18",
    "age_over_21",
    "age_in_years",
    "age_birth_year",
    "family_name_birth",
    "given_name_birth",
    "birth_place",
    "birth_country",
    "birth_state",
    "birth_city",
    "resident_address",
    "resident_country",
    "resident_state",
    "resident_city",
    "resident_postal_code",
    "resident_street",
    "resident_house_number",
    "gender",
    "nationality",
    "issuance_date",
    "expiry_date",
    "issuing_authority",
    "document_number",
    "administrative_number",
    "issuing_country",
    "issuing_jurisdiction",
    "portrait",
];

const MDL_CLAIMS: &[&str] = &[
    "family_name",
    "given_name",
    "birth_date",
    "issue_date",
    "expiry_date",
    "issuing_country",
    "issuing_authority",
    "document_number",
    "portrait",
    "driving_privileges",
    "un_distinguishing_sign",
    "administrative_number",
    "sex",
    "height",
    "weight",
    "eye_colour",
    "hair_colour",
    "birth_place",
    "resident_address",
    "portrait_capture_date",
    "age_in_years",
    "age_birth_year",
    "age_over_18",
    "age_over_21",
    "issuing_jurisdiction",
    "nationality",
    "resident_city",
    "resident_state",
    "resident_postal_code",
    "resident_country",
    "family_name_national_character",
    "given_name_national_character",
    "signature_usual_mark",
];

const AGE_VERIFICATION_CLAIMS: &[&str] = &["age_over_18"];

const PHOTO_ID_CLAIMS: &[&str] = &[
    "family_name",
    "given_name",
    "birth_date",
    "portrait",
    "issue_date",
    "expiry_date",
    "issuing_authority",
    "issuing_country",
    "age_over_18",
    "nationality",
    "document_number",
];

const PSEUDONYM_CLAIMS: &[&str] = &[
    "user_pseudonym",
    "issuance_date",
    "expiry_date",
    "issuing_country",
    "age_over_18",
];

impl DocumentCatalog {
    pub fn new(entries: BTreeMap<DocumentType, CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The catalog shipped with the verifier.
    pub fn standard() -> Self {
        let entries = DocumentType::iter()
            .map(|document_type| {
                let (claims, modes) = match document_type {
                    DocumentType::Pid => (PID_CLAIMS, vec![Mode::Full, Mode::Custom]),
                    DocumentType::Mdl => (MDL_CLAIMS, vec![Mode::Full, Mode::Custom]),
                    DocumentType::AgeVerification => (AGE_VERIFICATION_CLAIMS, vec![Mode::Full]),
                    DocumentType::PhotoId => (PHOTO_ID_CLAIMS, vec![Mode::Full, Mode::Custom]),
                    DocumentType::Pseudonym => (PSEUDONYM_CLAIMS, vec![Mode::Full, Mode::Custom]),
                };
                let entry = CatalogEntry {
                    claims: claims.iter().copied().map(ClaimItem::from).collect(),
                    modes,
                };
                (document_type, entry)
            })
            .collect();
        Self { entries }
    }

    /// Ordered claim list for a type; empty when the type is not catalogued.
    pub fn claims(&self, document_type: DocumentType) -> &[ClaimItem] {
        self.entries
            .get(&document_type)
            .map(|e| e.claims.as_slice())
            .unwrap_or_default()
    }

    pub fn modes(&self, document_type: DocumentType) -> &[Mode] {
        self.entries
            .get(&document_type)
            .map(|e| e.modes.as_slice())
            .unwrap_or_default()
    }

    pub fn supports(&self, document_type: DocumentType, mode: Mode) -> bool {
        self.modes(document_type).contains(&mode)
    }

    /// The operator-facing view of the catalog, one option per document type.
    pub fn options(&self) -> Vec<DocumentOption> {
        self.entries
            .iter()
            .map(|(document_type, entry)| DocumentOption {
                id: document_type.doc_type().to_string(),
                document_type: *document_type,
                display_name: document_type.display_name().to_string(),
                modes: entry.modes.clone(),
            })
            .collect()
    }

    pub fn entries(&self) -> &BTreeMap<DocumentType, CatalogEntry> {
        &self.entries
    }
}

impl Default for DocumentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
