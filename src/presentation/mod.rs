//! The verifier side of a proximity presentation: building the selection,
//! running the transfer session and interpreting what the holder returned.
pub mod claims;
pub mod display;
pub mod selection;
pub mod status;
pub mod transfer;
pub mod transport;
pub mod trust;

pub use selection::{check_document_mode, search, select_option, SelectionResult};
pub use status::{StatusReceiver, StatusStream, TransferSessionStatus};
pub use transfer::TransferSession;
pub use transport::{TransferEvent, TransferManager, VerificationProvider};
pub use trust::TrustedCertificates;
