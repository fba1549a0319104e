//! Runtime for driving a chat session
//!
//! One tokio task owns the [`SessionState`] and applies every event in
//! arrival order. Callers interact through a cloneable [`SessionHandle`]:
//! actions are enqueued, snapshots are published on a watch channel, and
//! incremental notices on a broadcast channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::api::{ChatBackend, Document, ProviderPreference, UploadFile};
use crate::session::{Event, MessageStamp, Notice, SessionState};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Session runtime has stopped")]
    Stopped,
}

/// Caller side of a running session
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::Sender<Event>,
    state_rx: watch::Receiver<SessionState>,
    notice_tx: broadcast::Sender<Notice>,
}

/// Start a session runtime on the current tokio runtime
pub fn spawn_session<B: ChatBackend + 'static>(backend: B) -> SessionHandle {
    let (event_tx, event_rx) = mpsc::channel(32);
    let (state_tx, state_rx) = watch::channel(SessionState::default());
    let (notice_tx, _) = broadcast::channel(128);

    let runtime = SessionRuntime::new(
        Arc::new(backend),
        event_rx,
        &event_tx,
        state_tx,
        notice_tx.clone(),
    );
    tokio::spawn(async move {
        runtime.run().await;
    });

    SessionHandle {
        event_tx,
        state_rx,
        notice_tx,
    }
}

impl SessionHandle {
    async fn dispatch(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    /// Request a new backend session
    pub async fn initialize(&self) -> Result<(), RuntimeError> {
        self.dispatch(Event::Initialize).await
    }

    pub async fn send_message(
        &self,
        content: impl Into<String>,
        provider: Option<ProviderPreference>,
    ) -> Result<(), RuntimeError> {
        self.dispatch(Event::SendMessage {
            content: content.into(),
            provider,
            stamp: MessageStamp::new(),
        })
        .await
    }

    /// Record a document the backend already holds
    pub async fn attach_document(&self, document: Document) -> Result<(), RuntimeError> {
        self.dispatch(Event::AttachDocument {
            document,
            stamp: MessageStamp::new(),
        })
        .await
    }

    pub async fn upload_document(&self, file: UploadFile) -> Result<(), RuntimeError> {
        self.dispatch(Event::UploadDocument { file }).await
    }

    pub async fn detach_document(&self, document_id: i64) -> Result<(), RuntimeError> {
        self.dispatch(Event::DetachDocument { document_id }).await
    }

    /// Drop the transcript, keeping the session and its documents
    pub async fn clear(&self) -> Result<(), RuntimeError> {
        self.dispatch(Event::Clear).await
    }

    /// Drop the transcript and start a fresh backend session
    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.dispatch(Event::Reset).await
    }

    pub fn snapshot(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    /// Wait for the first snapshot matching `predicate`, including the current one
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, RuntimeError> {
        let mut state_rx = self.state_rx.clone();
        let state = state_rx
            .wait_for(predicate)
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        Ok(state.clone())
    }
}
