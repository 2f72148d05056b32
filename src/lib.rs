//! Core of a proximity credential verifier.
//!
//! The verifier lets an operator pick which documents and claims to request,
//! drives a proximity transfer session with a holder's wallet through an
//! external verification library, and turns the response into documents ready
//! to display.
//!
//! # Example
//!
//! ```
//! use mdoc_verifier::definitions::{DocumentCatalog, DocumentType, Mode};
//! use mdoc_verifier::presentation::{select_option, SelectionResult};
//!
//! let catalog = DocumentCatalog::standard();
//! let result = select_option(&catalog, &[], "mdl", DocumentType::Mdl, Mode::Full);
//! let SelectionResult::Updated(documents) = result else {
//!     panic!("a full selection never needs claim editing")
//! };
//! assert_eq!(documents[0].claims, catalog.claims(DocumentType::Mdl));
//! ```
pub mod cbor;
pub mod definitions;
pub mod presentation;
pub mod settings;
