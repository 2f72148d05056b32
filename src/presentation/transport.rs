//! Interfaces of the verification library the transfer session drives.
//!
//! The library owns the proximity protocol: engagement, session encryption,
//! response parsing and certificate chain validation. The session only calls
//! into it and interprets its events.
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::trust::TrustedCertificates;
use crate::definitions::{DeviceRequest, DeviceResponse, EngagementCode, ResponseDocument};
use crate::settings::TransferConfig;

pub type ListenerId = Uuid;

/// Events raised by the transport while a session is live.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Connecting,
    Connected,
    DeviceEngagementCompleted,
    ResponseReceived(DeviceResponse),
    Disconnected,
    Error(String),
}

/// A registered listener. Dropping the receiver does not deregister it, see
/// [TransferManager::remove_listener].
#[derive(Debug)]
pub struct Subscription {
    pub id: ListenerId,
    pub events: mpsc::UnboundedReceiver<TransferEvent>,
}

impl Subscription {
    /// Create a subscription together with the sender the transport keeps.
    pub fn channel() -> (mpsc::UnboundedSender<TransferEvent>, Self) {
        let (sender, events) = mpsc::unbounded_channel();
        (
            sender,
            Self {
                id: Uuid::new_v4(),
                events,
            },
        )
    }
}

/// One proximity transport, as configured by
/// [VerificationProvider::create_transfer_manager].
pub trait TransferManager: Send + Sync {
    /// Begin engagement with the device advertised by `code`.
    fn start_qr_engagement(&self, code: &EngagementCode) -> Result<()>;

    fn add_listener(&self) -> Subscription;

    fn remove_listener(&self, id: ListenerId);

    /// Encrypt and send `request` over the live connection.
    fn send_request(&self, request: &DeviceRequest) -> Result<()>;

    /// Terminate the session and release the transport.
    fn stop_presentation(&self);
}

/// Entry points of the verification library.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Install the certificates used for trust evaluation.
    fn initialize(&self, trusted: TrustedCertificates) -> Result<()>;

    fn create_transfer_manager(&self, config: &TransferConfig) -> Result<Arc<dyn TransferManager>>;

    /// Whether the certificate chain of `document` is trusted at `at`.
    async fn is_document_trusted(&self, document: &ResponseDocument, at: OffsetDateTime)
        -> Result<bool>;
}
