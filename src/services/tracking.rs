//! Session tracking service implementation
//!
//! Mirrors accepted transitions to an external analytics sink. Every
//! `notify_*` call returns immediately; delivery happens on a background
//! worker behind a bounded queue. Failures and overflow are logged and dropped. Conversation state never
//! depends on the outcome of a tracking call.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::config::TrackingConfig;
use crate::state::conversation::{CollectedData, Sender};
use crate::utils::errors::{ChatFlowError, Result, TrackingError, TrackingResult};
use crate::utils::helpers::truncate_text;
use crate::utils::logging::log_tracking_failure;

/// Capability the controller reports transitions to
///
/// Implementations must not block: the conversation moves on before the
/// call is delivered, and a failed delivery is never reported back.
pub trait SessionTracker: Send + Sync + fmt::Debug {
    fn notify_session_start(&self, session_id: &str, access_key: &str);
    fn notify_message(&self, session_id: &str, sender: Sender, content: &str, at_state: &str);
    fn notify_data_checkpoint(&self, session_id: &str, snapshot: &CollectedData);
}

/// Logical tracking operations, serialized as the sink's request bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TrackingEvent {
    SessionStart {
        session_id: String,
        access_key: String,
    },
    Message {
        session_id: String,
        message_type: Sender,
        content: String,
        flow_state: String,
    },
    UserData {
        session_id: String,
        user_data: CollectedData,
    },
}

impl TrackingEvent {
    pub fn session_id(&self) -> &str {
        match self {
            TrackingEvent::SessionStart { session_id, .. }
            | TrackingEvent::Message { session_id, .. }
            | TrackingEvent::UserData { session_id, .. } => session_id,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            TrackingEvent::SessionStart { .. } => "start-session",
            TrackingEvent::Message { .. } => "track-message",
            TrackingEvent::UserData { .. } => "update-user-data",
        }
    }
}

/// Tracker for tenants or environments without analytics
#[derive(Debug, Clone, Default)]
pub struct NoopTracker;

impl SessionTracker for NoopTracker {
    fn notify_session_start(&self, session_id: &str, _access_key: &str) {
        trace!(session_id = session_id, "Tracking disabled, session start not sent");
    }

    fn notify_message(&self, session_id: &str, sender: Sender, _content: &str, at_state: &str) {
        trace!(session_id = session_id, sender = %sender, flow_state = at_state, "Tracking disabled, message not sent");
    }

    fn notify_data_checkpoint(&self, session_id: &str, _snapshot: &CollectedData) {
        trace!(session_id = session_id, "Tracking disabled, checkpoint not sent");
    }
}

/// Tracker that keeps every event in memory, in call order
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    events: Arc<Mutex<Vec<TrackingEvent>>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Snapshots sent through `notify_data_checkpoint`
    pub fn checkpoints(&self) -> Vec<CollectedData> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TrackingEvent::UserData { user_data, .. } => Some(user_data),
                _ => None,
            })
            .collect()
    }

    pub fn events_for(&self, session_id: &str) -> Vec<TrackingEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.session_id() == session_id)
            .collect()
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn push(&self, event: TrackingEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl SessionTracker for MemoryTracker {
    fn notify_session_start(&self, session_id: &str, access_key: &str) {
        self.push(TrackingEvent::SessionStart {
            session_id: session_id.to_string(),
            access_key: access_key.to_string(),
        });
    }

    fn notify_message(&self, session_id: &str, sender: Sender, content: &str, at_state: &str) {
        self.push(TrackingEvent::Message {
            session_id: session_id.to_string(),
            message_type: sender,
            content: content.to_string(),
            flow_state: at_state.to_string(),
        });
    }

    fn notify_data_checkpoint(&self, session_id: &str, snapshot: &CollectedData) {
        self.push(TrackingEvent::UserData {
            session_id: session_id.to_string(),
            user_data: snapshot.clone(),
        });
    }
}

enum Command {
    Deliver(TrackingEvent),
    Flush(oneshot::Sender<()>),
}

/// HTTP tracker backed by a single background worker
///
/// Events are queued in call order and posted one at a time, so the sink
/// sees them in the order transitions happened. The queue holds at most
/// `queue_capacity` events; while a slow sink keeps it full, new events are
/// dropped instead of waiting. The worker stops once every clone of the
/// tracker has been dropped.
#[derive(Debug, Clone)]
pub struct HttpTracker {
    sender: mpsc::Sender<Command>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl HttpTracker {
    /// Start the delivery worker; must be called from within a Tokio runtime
    pub fn spawn(config: &TrackingConfig) -> Result<Self> {
        if config.queue_capacity == 0 {
            return Err(ChatFlowError::Config("Tracking queue capacity must be greater than 0".to_string()));
        }

        let worker = TrackingWorker::new(config)?;
        let (sender, receiver) = mpsc::channel(config.queue_capacity);

        tokio::spawn(worker.run(receiver));
        debug!(api_url = %config.api_url, queue_capacity = config.queue_capacity, "Tracking worker started");

        Ok(Self {
            sender,
            capacity: config.queue_capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Wait until everything queued before this call has been delivered or dropped
    pub async fn flush(&self) -> TrackingResult<()> {
        let (done, wait) = oneshot::channel();
        self.sender
            .send(Command::Flush(done))
            .await
            .map_err(|_| TrackingError::WorkerStopped)?;
        wait.await.map_err(|_| TrackingError::WorkerStopped)
    }

    /// Events discarded because the queue was full or the worker had stopped
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn enqueue(&self, event: TrackingEvent) {
        let (command, error) = match self.sender.try_send(Command::Deliver(event)) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Full(command)) => {
                (command, TrackingError::QueueFull { capacity: self.capacity })
            }
            Err(mpsc::error::TrySendError::Closed(command)) => (command, TrackingError::WorkerStopped),
        };

        self.dropped.fetch_add(1, Ordering::Relaxed);
        if let Command::Deliver(event) = command {
            log_tracking_failure(event.operation(), event.session_id(), 0, &error.to_string());
        }
    }
}

impl SessionTracker for HttpTracker {
    fn notify_session_start(&self, session_id: &str, access_key: &str) {
        self.enqueue(TrackingEvent::SessionStart {
            session_id: session_id.to_string(),
            access_key: access_key.to_string(),
        });
    }

    fn notify_message(&self, session_id: &str, sender: Sender, content: &str, at_state: &str) {
        self.enqueue(TrackingEvent::Message {
            session_id: session_id.to_string(),
            message_type: sender,
            content: content.to_string(),
            flow_state: at_state.to_string(),
        });
    }

    fn notify_data_checkpoint(&self, session_id: &str, snapshot: &CollectedData) {
        self.enqueue(TrackingEvent::UserData {
            session_id: session_id.to_string(),
            user_data: snapshot.clone(),
        });
    }
}

struct TrackingWorker {
    client: Client,
    start_session_url: String,
    track_message_url: String,
    update_user_data_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl TrackingWorker {
    fn new(config: &TrackingConfig) -> Result<Self> {
        let base = url::Url::parse(&config.api_url)?;
        let base = base.as_str().trim_end_matches('/');

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("ChatFlow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ChatFlowError::Http)?;

        Ok(Self {
            client,
            start_session_url: join_endpoint(base, &config.start_session_path),
            track_message_url: join_endpoint(base, &config.track_message_path),
            update_user_data_url: join_endpoint(base, &config.update_user_data_path),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
        })
    }

    async fn run(self, mut receiver: mpsc::Receiver<Command>) {
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Deliver(event) => self.deliver(&event).await,
                Command::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        debug!("Tracking worker stopped");
    }

    fn endpoint(&self, event: &TrackingEvent) -> &str {
        match event {
            TrackingEvent::SessionStart { .. } => &self.start_session_url,
            TrackingEvent::Message { .. } => &self.track_message_url,
            TrackingEvent::UserData { .. } => &self.update_user_data_url,
        }
    }

    /// Post one event, retrying transient failures with exponential backoff
    async fn deliver(&self, event: &TrackingEvent) {
        let url = self.endpoint(event);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.post(url, event).await {
                Ok(()) => {
                    debug!(operation = event.operation(), session_id = event.session_id(), attempt = attempt, "Tracking event delivered");
                    return;
                }
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    let delay = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    debug!(operation = event.operation(), attempt = attempt, delay_ms = delay.as_millis() as u64, error = %e, "Retrying tracking event");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    log_tracking_failure(event.operation(), event.session_id(), attempt, &e.to_string());
                    return;
                }
            }
        }
    }

    async fn post(&self, url: &str, event: &TrackingEvent) -> TrackingResult<()> {
        let response = self.client
            .post(url)
            .json(event)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TrackingError::Timeout
                } else {
                    TrackingError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackingError::Rejected {
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            });
        }

        Ok(())
    }
}

fn join_endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}
