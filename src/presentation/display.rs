//! Capabilities the hosting application injects for presenting results.
use super::status::TransferSessionStatus;
use crate::definitions::ReceivedDocument;

/// Receives the documents of a successful session.
pub trait DocumentDisplay {
    /// `address` describes the connection the documents arrived over.
    fn show_documents(&self, documents: &[ReceivedDocument], address: &str);
}

/// Platform actions the core may ask for, e.g. after a fatal error or when a
/// permission has to be granted in the system settings.
pub trait PlatformActions {
    fn close_app(&self);
    fn open_app_settings(&self);
}

/// Forward a terminal `ResponseReceived` to `display`.
///
/// Returns whether `status` ends the session.
pub fn deliver_status(
    status: &TransferSessionStatus,
    address: &str,
    display: &dyn DocumentDisplay,
) -> bool {
    if let TransferSessionStatus::ResponseReceived(documents) = status {
        display.show_documents(documents, address);
    }
    status.is_terminal()
}
