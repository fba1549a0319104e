//! Session runtime executor

use crate::api::ChatBackend;
use crate::session::{transition, Effect, Event, MessageStamp, Notice, SessionState};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Event loop that owns the session state for one chat session
pub struct SessionRuntime<B: ChatBackend + 'static> {
    state: SessionState,
    backend: Arc<B>,
    event_rx: mpsc::Receiver<Event>,
    /// Completions are fed back through this; weak so the loop ends once
    /// every handle and in-flight request is gone
    event_tx: mpsc::WeakSender<Event>,
    state_tx: watch::Sender<SessionState>,
    notice_tx: broadcast::Sender<Notice>,
}

impl<B: ChatBackend + 'static> SessionRuntime<B> {
    pub fn new(
        backend: Arc<B>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: &mpsc::Sender<Event>,
        state_tx: watch::Sender<SessionState>,
        notice_tx: broadcast::Sender<Notice>,
    ) -> Self {
        let state = state_tx.borrow().clone();
        Self {
            state,
            backend,
            event_rx,
            event_tx: event_tx.downgrade(),
            state_tx,
            notice_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting session runtime");

        // Process events in a loop - no recursion
        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!(
            session_id = %self.state.session.session_id,
            "Session runtime stopped"
        );
    }

    fn process_event(&mut self, event: Event) {
        let name = event.name();

        let result = match transition(&self.state, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(event = name, error = %e, "Event left state unchanged");
                return;
            }
        };

        let phase_changed = result.new_state.phase != self.state.phase;
        if phase_changed {
            tracing::debug!(
                from = self.state.phase.name(),
                to = result.new_state.phase.name(),
                event = name,
                "Phase transition"
            );
        }

        self.state = result.new_state;
        self.state_tx.send_replace(self.state.clone());
        if phase_changed {
            let _ = self
                .notice_tx
                .send(Notice::PhaseChanged(self.state.phase.clone()));
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::CreateSession => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    tracing::info!("Creating chat session");
                    match backend.create_session().await {
                        Ok(created) => {
                            tracing::info!(
                                session_id = %created.session_id,
                                principles = ?created.islamic_principles,
                                features = ?created.platform_features,
                                "Chat session created"
                            );
                            Event::SessionCreated {
                                created,
                                stamp: MessageStamp::new(),
                            }
                        }
                        Err(e) => Event::SessionFailed { reason: e.message },
                    }
                });
            }

            Effect::ListDocuments { session_id } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.list_documents(&session_id).await {
                        Ok(documents) => {
                            tracing::info!(
                                session_id = %session_id,
                                count = documents.len(),
                                "Loaded session documents"
                            );
                            Event::DocumentsLoaded {
                                session_id,
                                documents,
                            }
                        }
                        Err(e) => Event::DocumentsLoadFailed {
                            session_id,
                            reason: e.message,
                        },
                    }
                });
            }

            Effect::SendChat { request } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    tracing::info!(
                        session_id = %request.session_id,
                        provider = ?request.preferred_provider,
                        "Sending chat message"
                    );
                    let result = backend.send_message(&request).await;
                    let stamp = MessageStamp::new();
                    match result {
                        Ok(reply) => Event::ChatReplied {
                            session_id: request.session_id,
                            reply,
                            stamp,
                        },
                        Err(e) => Event::ChatFailed {
                            session_id: request.session_id,
                            reason: e.message,
                            stamp,
                        },
                    }
                });
            }

            Effect::UploadDocument { session_id, file } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    tracing::info!(
                        session_id = %session_id,
                        file_name = %file.file_name,
                        size = file.size(),
                        "Uploading document"
                    );
                    match backend.upload_document(&session_id, &file).await {
                        Ok(receipt) => Event::UploadCompleted {
                            session_id,
                            receipt,
                            file_size: file.size(),
                            stamp: MessageStamp::new(),
                        },
                        Err(e) => Event::UploadFailed {
                            session_id,
                            reason: e.message,
                        },
                    }
                });
            }

            Effect::DeleteDocument { document_id } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    tracing::info!(document_id, "Deleting document");
                    match backend.delete_document(document_id).await {
                        Ok(()) => Event::DocumentDeleted { document_id },
                        Err(e) => Event::DocumentDeleteFailed {
                            document_id,
                            reason: e.message,
                        },
                    }
                });
            }

            Effect::Notify(notice) => {
                // No subscribers is fine
                let _ = self.notice_tx.send(notice);
            }
        }
    }

    /// Run a backend call in the background and feed its completion back
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let Some(event_tx) = self.event_tx.upgrade() else {
            tracing::debug!("Runtime shutting down, dropping request");
            return;
        };

        tokio::spawn(async move {
            let event = request.await;
            if event_tx.send(event).await.is_err() {
                tracing::debug!("Runtime stopped before completion arrived");
            }
        });
    }
}
