pub mod catalog;
pub mod device_request;
pub mod device_response;
pub mod document_type;
pub mod engagement;
pub mod helpers;
pub mod received_document;
pub mod requested_document;

pub use catalog::{CatalogEntry, ClaimItem, DocumentCatalog, DocumentOption, Mode};
pub use device_request::{DeviceRequest, DocRequest, ItemsRequest};
pub use device_response::{DeviceResponse, DocumentValidity, ResponseDocument};
pub use document_type::DocumentType;
pub use engagement::EngagementCode;
pub use received_document::{ClaimValue, Claims, ReceivedDocument};
pub use requested_document::RequestedDocument;
