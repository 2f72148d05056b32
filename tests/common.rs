use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{mpsc, Notify};

use mdoc_verifier::definitions::{
    DeviceRequest, DeviceResponse, DocumentType, DocumentValidity, EngagementCode,
    ResponseDocument,
};
use mdoc_verifier::presentation::status::StatusReceiver;
use mdoc_verifier::presentation::transport::{ListenerId, Subscription};
use mdoc_verifier::presentation::{
    TransferEvent, TransferManager, TransferSessionStatus, TrustedCertificates,
    VerificationProvider,
};
use mdoc_verifier::settings::TransferConfig;

#[allow(dead_code)]
pub const ENGAGEMENT: &str = "mdoc:owBjMS4wAYIB2BhYS6QBAiABIVgglyWXuAyJ6iRNc8OlYXenvkJt23rJPdtIhlawXqr-yf0iWCC1GQSH8tIwTYVwha_ZoPL20_saYXrGIbrCm133H0ki-QKBgwIBowD1AfQKUH2RiuAEbUVzrsrOiUnSPDw";

#[allow(dead_code)]
fn main() {}

/// Transport that records what the session asks of it and lets the test
/// script the events it raises.
#[derive(Default)]
pub struct FakeTransport {
    listeners: Mutex<Vec<(ListenerId, mpsc::UnboundedSender<TransferEvent>)>>,
    pub engagements: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<DeviceRequest>>,
    pub stopped: AtomicBool,
    pub fail_send: AtomicBool,
    pub fail_engagement: AtomicBool,
}

#[allow(dead_code)]
impl FakeTransport {
    /// Raise `event` on every registered listener. Returns how many received it.
    pub fn emit(&self, event: TransferEvent) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sender)| sender.send(event.clone()).is_ok())
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl TransferManager for FakeTransport {
    fn start_qr_engagement(&self, code: &EngagementCode) -> Result<()> {
        if self.fail_engagement.load(Ordering::SeqCst) {
            return Err(anyhow!("bluetooth unavailable"));
        }
        self.engagements
            .lock()
            .unwrap()
            .push(code.as_str().to_string());
        Ok(())
    }

    fn add_listener(&self) -> Subscription {
        let (sender, subscription) = Subscription::channel();
        self.listeners
            .lock()
            .unwrap()
            .push((subscription.id, sender));
        subscription
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().retain(|(l, _)| *l != id);
    }

    fn send_request(&self, request: &DeviceRequest) -> Result<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(anyhow!("session encryption failed"));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn stop_presentation(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Provider handing out a single [FakeTransport].
pub struct FakeProvider {
    pub transport: Arc<FakeTransport>,
    pub trusted: bool,
    pub certificates: AtomicUsize,
    pub configs: Mutex<Vec<TransferConfig>>,
    /// Trust evaluations started so far.
    pub evaluations: AtomicUsize,
    /// When set, trust evaluation waits for this before answering.
    pub gate: Option<Arc<Notify>>,
    pub evaluation_started: Arc<Notify>,
}

#[allow(dead_code)]
impl FakeProvider {
    pub fn new(trusted: bool) -> Self {
        Self {
            transport: Arc::new(FakeTransport::default()),
            trusted,
            certificates: AtomicUsize::new(0),
            configs: Mutex::new(Vec::new()),
            evaluations: AtomicUsize::new(0),
            gate: None,
            evaluation_started: Arc::new(Notify::new()),
        }
    }

    pub fn gated(trusted: bool, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(trusted)
        }
    }
}

#[async_trait]
impl VerificationProvider for FakeProvider {
    fn initialize(&self, trusted: TrustedCertificates) -> Result<()> {
        self.certificates.store(trusted.len(), Ordering::SeqCst);
        Ok(())
    }

    fn create_transfer_manager(&self, config: &TransferConfig) -> Result<Arc<dyn TransferManager>> {
        self.configs.lock().unwrap().push(*config);
        Ok(self.transport.clone())
    }

    async fn is_document_trusted(
        &self,
        _document: &ResponseDocument,
        _at: OffsetDateTime,
    ) -> Result<bool> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.evaluation_started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.trusted)
    }
}

/// A holder response carrying one document of `document_type` with the given
/// claims in the document type's namespace.
#[allow(dead_code)]
pub fn response(document_type: DocumentType, claims: &[(&str, ciborium::Value)]) -> DeviceResponse {
    let document = ResponseDocument {
        doc_type: document_type.doc_type().to_string(),
        namespaces: vec![(
            document_type.namespace().to_string(),
            claims
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        )],
    };
    let validity = BTreeMap::from([(
        document.doc_type.clone(),
        DocumentValidity {
            device_signature_valid: true,
            issuer_signature_valid: true,
            data_integrity_intact: true,
            ..Default::default()
        },
    )]);
    DeviceResponse {
        documents: vec![document],
        validity,
    }
}

/// Next status, failing the test if none arrives in time.
#[allow(dead_code)]
pub async fn next_status(receiver: &mut StatusReceiver) -> TransferSessionStatus {
    tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("timed out waiting for a status")
        .expect("status stream closed")
}

/// Give spawned session tasks a chance to run.
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
