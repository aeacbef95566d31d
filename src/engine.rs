//! Preview synchronization engine — one editing session per engine.
//!
//! DESIGN
//! ======
//! The engine is an actor. A single spawned task owns the session (source,
//! parameters, change classifier), the debounce slot and the request tracker,
//! and reacts to three event sources in one `select!` loop:
//!
//! - commands from `PreviewEngine` handles (bounded mpsc)
//! - the debounce deadline
//! - completions from spawned preview fetches
//!
//! Because only that task mutates state, there are no locks. Every mutation
//! re-arms the debounce; when it fires, the classifier decides whether the
//! preview-relevant view changed. A relevant change cancels the outstanding
//! fetch and, if the dimensions are positive, starts a new one under a fresh
//! generation. Completions are applied only when the tracker accepts their
//! generation, so the displayed preview is always the newest non-stale result.
//!
//! Status is published through a `watch` channel. Replacing the preview drops
//! the previous `Arc<PreviewState>`, which releases it once no caller holds a
//! clone.
//!
//! Export does not go through the actor loop beyond reading a snapshot of the
//! session; it runs in the caller's task, so exports never block previews and
//! may overlap each other.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify::{ChangeClassifier, PreviewSnapshot};
use crate::debounce::Debouncer;
use crate::export::{self, ExportArtifact, ExportError};
use crate::params::{ParameterChange, TransformParameters};
use crate::preview::{self, PreviewState};
use crate::process::{ImageProcessor, ProcessError, ProcessRequest};
use crate::source::SourceImage;
use crate::tracker::RequestTracker;

const COMMAND_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("preview engine is no longer running")]
    Closed,
}

/// What a UI renders: the current preview, whether one is loading, and the
/// last preview failure.
#[derive(Debug, Clone, Default)]
pub struct PreviewStatus {
    pub preview: Option<Arc<PreviewState>>,
    pub in_flight: bool,
    pub last_error: Option<String>,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable handle to a running engine. The engine stops once every handle is
/// dropped, aborting any outstanding preview fetch.
#[derive(Clone)]
pub struct PreviewEngine {
    session_id: Uuid,
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<PreviewStatus>,
    processor: Arc<dyn ImageProcessor>,
}

impl PreviewEngine {
    /// Start an engine task on the current tokio runtime.
    #[must_use]
    pub fn spawn(processor: Arc<dyn ImageProcessor>, debounce: Duration) -> Self {
        let session_id = Uuid::new_v4();
        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (status_tx, status) = watch::channel(PreviewStatus::default());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let task = EngineTask {
            session_id,
            processor: Arc::clone(&processor),
            session: None,
            debouncer: Debouncer::new(debounce),
            tracker: RequestTracker::new(),
            status: status_tx,
            completions_tx,
            completions_rx,
        };
        info!(%session_id, ?debounce, "preview engine started");
        tokio::spawn(task.run(command_rx));

        Self { session_id, commands, status, processor }
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Start a fresh session on `source` with default parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine task has stopped.
    pub async fn load_source(&self, source: SourceImage) -> Result<(), EngineError> {
        self.send(Command::LoadSource(Arc::new(source))).await
    }

    /// Drop the session, cancel outstanding work and release the preview.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine task has stopped.
    pub async fn remove_source(&self) -> Result<(), EngineError> {
        self.send(Command::RemoveSource).await
    }

    /// Apply one edit. Ignored while no source is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine task has stopped.
    pub async fn update_parameter(&self, change: ParameterChange) -> Result<(), EngineError> {
        self.send(Command::Update(change)).await
    }

    /// Reset width and height to the source's natural size in the active unit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine task has stopped.
    pub async fn fit_to_source(&self) -> Result<(), EngineError> {
        self.send(Command::FitToSource).await
    }

    /// Current parameters, or `None` without a source.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine task has stopped.
    pub async fn parameters(&self) -> Result<Option<TransformParameters>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Parameters(reply)).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    #[must_use]
    pub fn current_preview(&self) -> Option<Arc<PreviewState>> {
        self.status.borrow().preview.clone()
    }

    #[must_use]
    pub fn status(&self) -> PreviewStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PreviewStatus> {
        self.status.clone()
    }

    /// Export the current session with full parameters, crop and rotation.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EngineClosed`] if the engine task has stopped,
    /// otherwise whatever [`export::export_image`] returns.
    pub async fn request_export(&self) -> Result<ExportArtifact, ExportError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ExportSnapshot(reply))
            .await
            .map_err(|_| ExportError::EngineClosed)?;
        let snapshot = rx.await.map_err(|_| ExportError::EngineClosed)?;

        let (params, source) = snapshot.ok_or(ExportError::NoSource)?;
        export::export_image(self.processor.as_ref(), &params, Some(&source)).await
    }

    async fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands.send(command).await.map_err(|_| EngineError::Closed)
    }
}

// =============================================================================
// ACTOR
// =============================================================================

enum Command {
    LoadSource(Arc<SourceImage>),
    RemoveSource,
    Update(ParameterChange),
    FitToSource,
    Parameters(oneshot::Sender<Option<TransformParameters>>),
    ExportSnapshot(oneshot::Sender<Option<(TransformParameters, Arc<SourceImage>)>>),
}

struct Completion {
    generation: u64,
    result: Result<PreviewState, ProcessError>,
}

struct Session {
    source: Arc<SourceImage>,
    params: TransformParameters,
    classifier: ChangeClassifier,
}

impl Session {
    fn new(source: Arc<SourceImage>) -> Self {
        Self { source, params: TransformParameters::default(), classifier: ChangeClassifier::new() }
    }
}

struct EngineTask {
    session_id: Uuid,
    processor: Arc<dyn ImageProcessor>,
    session: Option<Session>,
    debouncer: Debouncer,
    tracker: RequestTracker,
    status: watch::Sender<PreviewStatus>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl EngineTask {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                () = self.debouncer.wait(), if self.debouncer.is_armed() => {
                    self.debouncer.disarm();
                    self.evaluate();
                }
                Some(completion) = self.completions_rx.recv() => self.complete(completion),
            }
        }
        self.tracker.cancel();
        info!(session_id = %self.session_id, "preview engine stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::LoadSource(source) => {
                info!(
                    session_id = %self.session_id,
                    name = source.name(),
                    width = source.natural_width(),
                    height = source.natural_height(),
                    "source loaded"
                );
                self.tracker.cancel();
                self.session = Some(Session::new(source));
                self.status.send_replace(PreviewStatus::default());
                self.debouncer.arm();
            }
            Command::RemoveSource => {
                info!(session_id = %self.session_id, "source removed");
                self.tracker.cancel();
                self.debouncer.disarm();
                self.session = None;
                self.status.send_replace(PreviewStatus::default());
            }
            Command::Update(change) => self.update(change),
            Command::FitToSource => {
                let Some(session) = &self.session else {
                    debug!(session_id = %self.session_id, "fit ignored without a source");
                    return;
                };
                let change = ParameterChange::FitToSource {
                    natural_width: session.source.natural_width(),
                    natural_height: session.source.natural_height(),
                };
                self.update(change);
            }
            Command::Parameters(reply) => {
                let _ = reply.send(self.session.as_ref().map(|s| s.params.clone()));
            }
            Command::ExportSnapshot(reply) => {
                let _ = reply.send(self.session.as_ref().map(|s| (s.params.clone(), Arc::clone(&s.source))));
            }
        }
    }

    fn update(&mut self, change: ParameterChange) {
        let Some(session) = &mut self.session else {
            debug!(session_id = %self.session_id, ?change, "edit ignored without a source");
            return;
        };
        debug!(session_id = %self.session_id, ?change, "parameter updated");
        session.params.apply(change);
        self.debouncer.arm();
    }

    /// Debounce fired: re-render if the preview-relevant view changed.
    fn evaluate(&mut self) {
        let request = {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            let snapshot = PreviewSnapshot::from(&session.params);
            if !session.classifier.observe(snapshot).relevant {
                debug!(session_id = %self.session_id, "no preview-relevant change");
                return;
            }
            preview::build_preview_request(&session.params, &session.source)
        };

        self.tracker.cancel();
        match request {
            Some(request) => self.start_fetch(request),
            None => {
                debug!(session_id = %self.session_id, "preview skipped: width and height must be positive");
                self.status.send_modify(|s| s.in_flight = false);
            }
        }
    }

    fn start_fetch(&mut self, request: ProcessRequest) {
        let generation = self.tracker.begin();
        debug!(session_id = %self.session_id, generation, format = %request.format, "preview requested");

        let processor = Arc::clone(&self.processor);
        let completions = self.completions_tx.clone();
        let handle = tokio::spawn(async move {
            let result = preview::fetch_preview(processor.as_ref(), request, generation).await;
            let _ = completions.send(Completion { generation, result });
        });
        self.tracker.attach(generation, handle.abort_handle());
        self.status.send_modify(|s| s.in_flight = true);
    }

    fn complete(&mut self, completion: Completion) {
        let Completion { generation, result } = completion;
        if !self.tracker.settle(generation) {
            return;
        }

        match result {
            Ok(preview) => {
                info!(session_id = %self.session_id, generation, size = %preview.size_label(), "preview updated");
                let preview = Arc::new(preview);
                self.status.send_modify(|s| {
                    s.preview = Some(preview);
                    s.in_flight = false;
                    s.last_error = None;
                });
            }
            Err(e) => {
                warn!(session_id = %self.session_id, generation, error = %e, "preview failed");
                self.status.send_modify(|s| {
                    s.in_flight = false;
                    s.last_error = Some(e.to_string());
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
