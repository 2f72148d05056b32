//! Drives one proximity transfer session from engagement to evaluated response.
//!
//! ```text
//! Idle --start_engagement--> Connecting --Connected--> Connected --(request)--> RequestSent
//! RequestSent --ResponseReceived--> evaluation --> ResponseReceived(documents) | Error
//! any --Error--> Error        any --Disconnected--> Disconnected
//! ```
//!
//! Statuses go to a [StatusStream]. [TransferSession::stop_connection] moves the
//! stream to a new epoch, so nothing from the stopped session is published
//! once it returns.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::claims::{flatten, reconcile};
use super::status::{StatusReceiver, StatusStream, TransferSessionStatus};
use super::transport::{ListenerId, TransferEvent, TransferManager, VerificationProvider};
use super::trust::TrustedCertificates;
use crate::definitions::{
    DeviceRequest, DeviceResponse, DocumentType, DocumentValidity, EngagementCode,
    ReceivedDocument, RequestedDocument, ResponseDocument,
};
use crate::settings::TransferConfig;

/// Shown when a failure carries no message of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("the transfer manager has not been initialized")]
    NotInitialized,
    #[error("no async runtime available to run the session on")]
    NoRuntime,
    #[error("no document with claims was requested")]
    NoRequestedDocuments,
    #[error("unsupported document type: {0}")]
    UnsupportedDocType(String),
    #[error("no validity information for document type: {0}")]
    MissingValidity(String),
    #[error("trust evaluation failed: {0}")]
    Trust(String),
    #[error("response evaluation failed: {0}")]
    Evaluation(String),
    #[error("{0}")]
    Transport(String),
    #[error("verifier initialization failed: {0}")]
    Initialization(String),
}

/// Orchestrates a single proximity transfer session at a time.
pub struct TransferSession {
    provider: Arc<dyn VerificationProvider>,
    status: Arc<StatusStream>,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    runtime: Option<Handle>,
    transfer_manager: Option<Arc<dyn TransferManager>>,
    listener: Option<ListenerId>,
    event_loop: Option<JoinHandle<()>>,
}

/// Everything the event loop of one session needs.
struct SessionContext {
    provider: Arc<dyn VerificationProvider>,
    transfer_manager: Arc<dyn TransferManager>,
    status: Arc<StatusStream>,
    epoch: u64,
    request: DeviceRequest,
    requested: Vec<RequestedDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingConnection,
    RequestSent,
}

impl TransferSession {
    pub fn new(provider: Arc<dyn VerificationProvider>) -> Self {
        Self {
            provider,
            status: Arc::new(StatusStream::new()),
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand the trusted issuer certificates to the verification library.
    /// Returns how many certificates were accepted.
    pub fn initialize_verifier<I, S>(&self, pem_sources: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let trusted = TrustedCertificates::from_pem_sources(pem_sources);
        let count = trusted.len();
        self.provider
            .initialize(trusted)
            .map_err(|e| Error::Initialization(message_of(&e)))?;
        info!(count, "verifier initialized");
        Ok(count)
    }

    /// Create the transport for the next session. Must be called from within a
    /// tokio runtime, which then hosts the session's tasks.
    pub fn initialize_transfer_manager(&self, config: &TransferConfig) -> Result<(), Error> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let transfer_manager = self
            .provider
            .create_transfer_manager(config)
            .map_err(|e| Error::Transport(message_of(&e)))?;
        let mut state = self.state();
        state.runtime = Some(runtime);
        state.transfer_manager = Some(transfer_manager);
        debug!(?config, "transfer manager initialized");
        Ok(())
    }

    /// Start engaging with the holder device advertised by `code`.
    pub fn start_engagement(&self, code: &EngagementCode) -> Result<(), Error> {
        let transfer_manager = self
            .state()
            .transfer_manager
            .clone()
            .ok_or(Error::NotInitialized)?;
        let epoch = self.status.epoch();
        self.status.publish(epoch, TransferSessionStatus::Connecting);
        info!("starting engagement");
        transfer_manager.start_qr_engagement(code).map_err(|e| {
            let message = message_of(&e);
            warn!("engagement failed: {message}");
            self.status
                .publish(epoch, TransferSessionStatus::Error(message.clone()));
            Error::Transport(message)
        })
    }

    /// Freeze `documents` into the request sent once the transport connects,
    /// and start listening for transport events.
    ///
    /// A listener installed by an earlier call is removed first, and statuses of
    /// that earlier session are no longer replayed.
    pub fn send_request(
        &self,
        documents: Vec<RequestedDocument>,
        intent_to_retain: bool,
    ) -> Result<StatusReceiver, Error> {
        let request = DeviceRequest::from_requested(&documents, intent_to_retain)
            .ok_or(Error::NoRequestedDocuments)?;

        let mut state = self.state();
        let (Some(transfer_manager), Some(runtime)) =
            (state.transfer_manager.clone(), state.runtime.clone())
        else {
            return Err(Error::NotInitialized);
        };

        let epoch = match state.listener.take() {
            Some(previous) => {
                debug!(%previous, "replacing transfer listener");
                transfer_manager.remove_listener(previous);
                if let Some(event_loop) = state.event_loop.take() {
                    event_loop.abort();
                }
                self.status.reset()
            }
            None => self.status.epoch(),
        };

        let subscription = transfer_manager.add_listener();
        let receiver = self.status.subscribe();
        let context = SessionContext {
            provider: self.provider.clone(),
            transfer_manager,
            status: self.status.clone(),
            epoch,
            request,
            requested: documents,
        };
        state.listener = Some(subscription.id);
        state.event_loop = Some(runtime.spawn(context.run(subscription.events)));
        Ok(receiver)
    }

    /// Subscribe to session statuses. The most recent status is replayed.
    pub fn subscribe(&self) -> StatusReceiver {
        self.status.subscribe()
    }

    pub fn latest_status(&self) -> Option<TransferSessionStatus> {
        self.status.latest()
    }

    /// Tear the session down and return to idle. Safe to call at any time.
    pub fn stop_connection(&self) {
        self.status.reset();
        let state = std::mem::take(&mut *self.state());
        if let Some(event_loop) = state.event_loop {
            event_loop.abort();
        }
        if let Some(transfer_manager) = state.transfer_manager {
            if let Some(listener) = state.listener {
                transfer_manager.remove_listener(listener);
            }
            transfer_manager.stop_presentation();
            info!("transfer session stopped");
        }
    }
}

impl Drop for TransferSession {
    fn drop(&mut self) {
        self.stop_connection();
    }
}

impl SessionContext {
    fn publish(&self, status: TransferSessionStatus) -> bool {
        self.status.publish(self.epoch, status)
    }

    async fn run(self, mut events: mpsc::UnboundedReceiver<TransferEvent>) {
        let mut phase = Phase::AwaitingConnection;
        while let Some(event) = events.recv().await {
            match event {
                TransferEvent::Connecting => {
                    self.publish(TransferSessionStatus::Connecting);
                }
                TransferEvent::Connected => {
                    self.publish(TransferSessionStatus::Connected);
                    if phase == Phase::RequestSent {
                        warn!("transport reconnected after the request was sent");
                        continue;
                    }
                    if let Err(e) = self.transfer_manager.send_request(&self.request) {
                        self.publish(TransferSessionStatus::Error(message_of(&e)));
                        return;
                    }
                    phase = Phase::RequestSent;
                    info!("request sent");
                    self.publish(TransferSessionStatus::RequestSent);
                }
                TransferEvent::DeviceEngagementCompleted => {
                    self.publish(TransferSessionStatus::DeviceEngagementCompleted);
                }
                TransferEvent::ResponseReceived(response) => {
                    if phase != Phase::RequestSent {
                        warn!("ignoring response received before the request was sent");
                        continue;
                    }
                    let status = match evaluate_response(self.provider.clone(), response).await {
                        Ok(documents) => {
                            let documents = reconcile(&self.requested, &documents);
                            info!(count = documents.len(), "response evaluated");
                            TransferSessionStatus::ResponseReceived(documents)
                        }
                        Err(e) => {
                            warn!("response evaluation failed: {e}");
                            TransferSessionStatus::Error(message_of(&e))
                        }
                    };
                    self.publish(status);
                    return;
                }
                TransferEvent::Disconnected => {
                    info!("holder disconnected");
                    self.publish(TransferSessionStatus::Disconnected);
                    return;
                }
                TransferEvent::Error(message) => {
                    warn!("transport error: {message}");
                    self.publish(TransferSessionStatus::Error(non_empty(message)));
                    return;
                }
            }
        }
        debug!("transport closed the event channel");
    }
}

/// Evaluate every document of `response` concurrently. Any failing document
/// fails the whole response.
pub async fn evaluate_response(
    provider: Arc<dyn VerificationProvider>,
    response: DeviceResponse,
) -> Result<Vec<ReceivedDocument>, Error> {
    let now = OffsetDateTime::now_utc();
    let validity = response
        .documents
        .iter()
        .map(|document| response.validity_for(&document.doc_type).copied())
        .collect::<Vec<_>>();

    let mut tasks = JoinSet::new();
    let documents = response.documents.into_iter().zip(validity);
    for (index, (document, validity)) in documents.enumerate() {
        let provider = provider.clone();
        tasks.spawn(async move {
            evaluate_document(provider, document, validity, now)
                .await
                .map(|received| (index, received))
        });
    }

    let mut evaluated = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(|e| Error::Evaluation(e.to_string()))?;
        // Returning early drops the set, which aborts the remaining tasks.
        evaluated.push(result?);
    }
    evaluated.sort_by_key(|(index, _)| *index);
    Ok(evaluated.into_iter().map(|(_, document)| document).collect())
}

async fn evaluate_document(
    provider: Arc<dyn VerificationProvider>,
    document: ResponseDocument,
    validity: Option<DocumentValidity>,
    now: OffsetDateTime,
) -> Result<ReceivedDocument, Error> {
    let document_type = DocumentType::from_doc_type(&document.doc_type)
        .ok_or_else(|| Error::UnsupportedDocType(document.doc_type.clone()))?;
    let validity = validity.ok_or_else(|| Error::MissingValidity(document.doc_type.clone()))?;
    let trusted = provider
        .is_document_trusted(&document, now)
        .await
        .map_err(|e| Error::Trust(message_of(&e)))?;
    if !validity.is_valid(now) {
        warn!(doc_type = %document.doc_type, "document failed the library's validity checks");
    }
    debug!(doc_type = %document.doc_type, trusted, "document evaluated");
    Ok(ReceivedDocument {
        id: Uuid::new_v4(),
        document_type,
        trusted,
        claims: flatten(&document.namespaces),
        validity,
    })
}

fn message_of(error: &dyn std::fmt::Display) -> String {
    non_empty(error.to_string())
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}
