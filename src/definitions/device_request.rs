use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document_type::{DocType, NameSpace};
use super::helpers::NonEmptyVec;
use super::requested_document::RequestedDocument;
use crate::cbor::{self, CborError};

pub type IntentToRetain = bool;
pub type DataElementIdentifier = String;
pub type DataElements = BTreeMap<DataElementIdentifier, IntentToRetain>;
pub type Namespaces = BTreeMap<NameSpace, DataElements>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub version: String,
    pub doc_requests: NonEmptyVec<DocRequest>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRequest {
    pub items_request: ItemsRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsRequest {
    pub doc_type: DocType,
    #[serde(rename = "nameSpaces")]
    pub namespaces: Namespaces,
}

impl DeviceRequest {
    pub const VERSION: &'static str = "1.0";

    /// Freeze a selection into the request sent to the holder.
    ///
    /// Documents without claims are left out, and documents sharing a doc type
    /// are merged into one item request. Returns [None] if nothing remains.
    pub fn from_requested(
        documents: &[RequestedDocument],
        intent_to_retain: IntentToRetain,
    ) -> Option<Self> {
        let mut doc_requests: Vec<DocRequest> = Vec::new();
        for document in documents.iter().filter(|d| !d.claims.is_empty()) {
            let doc_type = document.document_type.doc_type();
            let position = doc_requests
                .iter()
                .position(|r| r.items_request.doc_type == doc_type);
            let items_request = match position {
                Some(i) => &mut doc_requests[i].items_request,
                None => {
                    doc_requests.push(DocRequest {
                        items_request: ItemsRequest {
                            doc_type: doc_type.to_string(),
                            namespaces: Namespaces::new(),
                        },
                    });
                    let last = doc_requests.len() - 1;
                    &mut doc_requests[last].items_request
                }
            };
            let elements = items_request
                .namespaces
                .entry(document.document_type.namespace().to_string())
                .or_default();
            for claim in &document.claims {
                elements.insert(claim.label.clone(), intent_to_retain);
            }
        }
        NonEmptyVec::maybe_new(doc_requests).map(|doc_requests| Self {
            version: Self::VERSION.to_string(),
            doc_requests,
        })
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, CborError> {
        cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, CborError> {
        cbor::from_slice(bytes)
    }
}
