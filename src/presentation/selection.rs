//! Reconciliation of the operator's document selection.
//!
//! Every operation here is pure: it takes the current list of requested
//! documents and returns the next one.
use tracing::debug;

use crate::definitions::{
    ClaimItem, DocumentCatalog, DocumentOption, DocumentType, Mode, RequestedDocument,
};

/// Outcome of [select_option].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    /// The new authoritative list of requested documents.
    Updated(Vec<RequestedDocument>),
    /// Claim-level editing is required before the selection is final.
    ///
    /// `documents` no longer contains a full selection for the option, `draft`
    /// is a custom request with no claims selected.
    NavigateToCustomRequest {
        documents: Vec<RequestedDocument>,
        draft: RequestedDocument,
    },
}

impl SelectionResult {
    pub fn documents(&self) -> &[RequestedDocument] {
        match self {
            Self::Updated(documents) => documents,
            Self::NavigateToCustomRequest { documents, .. } => documents,
        }
    }
}

/// Apply the operator picking `mode` for the catalog option `doc_id`.
///
/// Picking the same option and mode twice deselects it.
pub fn select_option(
    catalog: &DocumentCatalog,
    current: &[RequestedDocument],
    doc_id: &str,
    document_type: DocumentType,
    mode: Mode,
) -> SelectionResult {
    if current.iter().any(|d| d.id == doc_id && d.mode == mode) {
        debug!(doc_id, ?mode, "deselecting document");
        let documents = current
            .iter()
            .filter(|d| !(d.id == doc_id && d.mode == mode))
            .cloned()
            .collect();
        return SelectionResult::Updated(documents);
    }

    match mode {
        Mode::Custom => {
            let documents = current
                .iter()
                .filter(|d| !(d.id == doc_id && d.mode == Mode::Full))
                .cloned()
                .collect();
            debug!(doc_id, ?document_type, "custom selection requires claim editing");
            SelectionResult::NavigateToCustomRequest {
                documents,
                draft: RequestedDocument::custom_draft(doc_id, document_type),
            }
        }
        Mode::Full => {
            let mut documents: Vec<RequestedDocument> = current
                .iter()
                .filter(|d| d.document_type != document_type)
                .cloned()
                .collect();
            documents.push(RequestedDocument::full(doc_id, document_type, catalog));
            debug!(doc_id, ?document_type, "full selection added");
            SelectionResult::Updated(documents)
        }
    }
}

/// Promote every document whose claim count matches the catalog count for its
/// type to [Mode::Full].
///
/// Only the number of claims is compared, not which claims they are. A document
/// without claims is never promoted.
pub fn check_document_mode(
    catalog: &DocumentCatalog,
    documents: Vec<RequestedDocument>,
) -> Vec<RequestedDocument> {
    documents
        .into_iter()
        .map(|mut document| {
            if !document.claims.is_empty()
                && document.claims.len() == catalog.claims(document.document_type).len()
            {
                document.mode = Mode::Full;
            }
            document
        })
        .collect()
}

/// Merge the result of claim editing back into the selection.
///
/// The edited document replaces any other request for its type; a document
/// left with no claims is dropped. The result goes through
/// [check_document_mode].
pub fn finish_custom_request(
    catalog: &DocumentCatalog,
    documents: Vec<RequestedDocument>,
    draft: RequestedDocument,
    claims: Vec<ClaimItem>,
) -> Vec<RequestedDocument> {
    let mut documents: Vec<RequestedDocument> = documents
        .into_iter()
        .filter(|d| d.document_type != draft.document_type)
        .collect();
    if !claims.is_empty() {
        documents.push(draft.with_claims(claims));
    }
    check_document_mode(catalog, documents)
}

/// Case-insensitive substring search over option names and mode names.
pub fn search(query: &str, options: &[DocumentOption]) -> Vec<DocumentOption> {
    let query = query.to_lowercase();
    options
        .iter()
        .filter(|option| {
            option.display_name.to_lowercase().contains(&query)
                || option
                    .modes
                    .iter()
                    .any(|mode| mode.display_name().to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn pid_id() -> &'static str {
        DocumentType::Pid.doc_type()
    }

    fn updated(result: SelectionResult) -> Vec<RequestedDocument> {
        match result {
            SelectionResult::Updated(documents) => documents,
            other => panic!("expected an updated selection, got {other:?}"),
        }
    }

    #[test]
    fn selecting_twice_is_a_no_op() {
        let catalog = DocumentCatalog::standard();
        let original = vec![RequestedDocument::full(
            "mdl",
            DocumentType::Mdl,
            &catalog,
        )];

        let selected = updated(select_option(
            &catalog,
            &original,
            pid_id(),
            DocumentType::Pid,
            Mode::Full,
        ));
        assert_eq!(selected.len(), 2);

        let deselected = updated(select_option(
            &catalog,
            &selected,
            pid_id(),
            DocumentType::Pid,
            Mode::Full,
        ));
        assert_eq!(deselected, original);
    }

    #[test]
    fn full_selection_carries_catalog_claims() {
        let catalog = DocumentCatalog::standard();
        let mut documents: Vec<RequestedDocument> = vec![];
        for _ in 0..3 {
            documents = updated(select_option(
                &catalog,
                &documents,
                pid_id(),
                DocumentType::Pid,
                Mode::Full,
            ));
            if let SelectionResult::NavigateToCustomRequest { documents: left, .. } =
                select_option(&catalog, &documents, pid_id(), DocumentType::Pid, Mode::Custom)
            {
                assert!(left.is_empty());
            }
        }
        // Odd number of toggles leaves the full selection in place.
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].mode, Mode::Full);
        assert_eq!(documents[0].claims, catalog.claims(DocumentType::Pid));
    }

    #[test]
    fn custom_selection_drops_full() {
        let catalog = DocumentCatalog::standard();
        let current = vec![RequestedDocument::full(pid_id(), DocumentType::Pid, &catalog)];

        let result = select_option(&catalog, &current, pid_id(), DocumentType::Pid, Mode::Custom);
        let SelectionResult::NavigateToCustomRequest { documents, draft } = result else {
            panic!("expected navigation to custom request");
        };
        assert!(!documents
            .iter()
            .any(|d| d.document_type == DocumentType::Pid && d.mode == Mode::Full));
        assert_eq!(draft.mode, Mode::Custom);
        assert_eq!(draft.id, pid_id());
        assert!(draft.claims.is_empty());
    }

    #[test]
    fn full_selection_replaces_custom() {
        let catalog = DocumentCatalog::standard();
        let current = vec![RequestedDocument::custom_draft(pid_id(), DocumentType::Pid)
            .with_claims(vec![ClaimItem::new("family_name")])];

        let documents = updated(select_option(
            &catalog,
            &current,
            pid_id(),
            DocumentType::Pid,
            Mode::Full,
        ));
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].mode, Mode::Full);
    }

    #[test]
    fn deselecting_custom() {
        let catalog = DocumentCatalog::standard();
        let current = vec![RequestedDocument::custom_draft(pid_id(), DocumentType::Pid)
            .with_claims(vec![ClaimItem::new("family_name")])];
        let documents = updated(select_option(
            &catalog,
            &current,
            pid_id(),
            DocumentType::Pid,
            Mode::Custom,
        ));
        assert!(documents.is_empty());
    }

    #[test]
    fn complete_custom_selection_is_promoted() {
        let catalog = DocumentCatalog::standard();
        let complete = RequestedDocument::custom_draft("pid", DocumentType::Pid)
            .with_claims(catalog.claims(DocumentType::Pid).to_vec());
        let partial = RequestedDocument::custom_draft("mdl", DocumentType::Mdl)
            .with_claims(vec![ClaimItem::new("family_name")]);

        let documents = check_document_mode(&catalog, vec![complete, partial]);
        assert_eq!(documents[0].mode, Mode::Full);
        assert_eq!(documents[1].mode, Mode::Custom);
    }

    #[test]
    fn empty_document_of_uncatalogued_type_stays_custom() {
        let catalog = DocumentCatalog::new(Default::default());
        let draft = RequestedDocument::custom_draft("pid", DocumentType::Pid);

        let documents = check_document_mode(&catalog, vec![draft]);
        assert_eq!(documents[0].mode, Mode::Custom);
    }

    #[test]
    fn finishing_custom_request() {
        let catalog = DocumentCatalog::standard();
        let draft = RequestedDocument::custom_draft("av", DocumentType::AgeVerification);

        let documents = finish_custom_request(
            &catalog,
            vec![],
            draft.clone(),
            vec![ClaimItem::new("age_over_18")],
        );
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].mode, Mode::Full);

        let documents = finish_custom_request(&catalog, documents, draft, vec![]);
        assert!(documents.is_empty());
    }

    #[test]
    fn search_matches_names_and_modes() {
        let options = DocumentCatalog::standard().options();

        let found = search("driving", &options);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].document_type, DocumentType::Mdl);

        let found = search("CUSTOM", &options);
        assert!(found
            .iter()
            .all(|o| o.document_type != DocumentType::AgeVerification));
        assert_eq!(found.len(), options.len() - 1);

        assert!(search("passport", &options).is_empty());
        assert_eq!(search("", &options).len(), options.len());
    }
}
