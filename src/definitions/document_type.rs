//! The closed set of document types a verifier can request.
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

pub type DocType = String;
pub type NameSpace = String;

/// A credential type known to the verifier.
///
/// Each variant maps onto one wire-level doc type and one namespace under which
/// its claims are requested.
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
pub enum DocumentType {
    /// Person identification data.
    Pid,
    /// ISO/IEC 18013-5 mobile driving licence.
    Mdl,
    /// Proof of age attestation.
    AgeVerification,
    /// ISO/IEC 23220 photo ID.
    PhotoId,
    /// Pseudonym attestation.
    Pseudonym,
}

impl DocumentType {
    pub fn doc_type(&self) -> &'static str {
        match self {
            Self::Pid => "eu.europa.ec.eudi.pid.1",
            Self::Mdl => "org.iso.18013.5.1.mDL",
            Self::AgeVerification => "eu.europa.ec.av.1",
            Self::PhotoId => "org.iso.23220.photoid.1",
            Self::Pseudonym => "eu.europa.ec.eudi.pseudonym.age_over_18.1",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Pid => "eu.europa.ec.eudi.pid.1",
            Self::Mdl => "org.iso.18013.5.1",
            Self::AgeVerification => "eu.europa.ec.av.1",
            Self::PhotoId => "org.iso.23220.photoid.1",
            Self::Pseudonym => "eu.europa.ec.eudi.pseudonym.age_over_18.1",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pid => "PID",
            Self::Mdl => "Mobile Driving License",
            Self::AgeVerification => "Age Verification",
            Self::PhotoId => "Photo ID",
            Self::Pseudonym => "Pseudonym",
        }
    }

    /// Look up the document type for a wire-level doc type.
    pub fn from_doc_type(doc_type: &str) -> Option<Self> {
        Self::iter().find(|t| t.doc_type() == doc_type)
    }
}
