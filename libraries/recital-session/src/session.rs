//! Reading session runtime
//!
//! One tokio task owns a [`ReadingController`] and multiplexes everything that
//! can move it: commands from [`SessionHandle`]s, engine events, timer
//! firings, ETA ticks, periodic checkpoints and autosave flushes. Controller
//! events are broadcast to subscribers after every input.

use recital_core::storage::PositionStore;
use recital_core::traits::{Clock, EngineEvent, SpeechEngine};
use recital_core::types::{DocumentId, PositionSnapshot, ReaderState, TimerToken, VoiceParamsUpdate};
use recital_playback::{ControllerSettings, PlaybackError, ReaderEvent, ReaderStatus, ReadingController};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::autosave::AutosavePolicy;
use crate::error::{Result, SessionError};
use crate::scheduler::{TokioClock, TokioScheduler};

/// Broadcast buffer per subscriber
const EVENT_CAPACITY: usize = 256;

/// Shortest period accepted for the session intervals
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Timing knobs of the session loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How often the ETA is refreshed while requested
    pub eta_tick: Duration,

    /// How often a periodic checkpoint is requested while speaking
    pub checkpoint_interval: Duration,

    /// Delay before an advance or checkpoint reaches the store
    pub autosave_debounce: Duration,

    /// How often due saves are flushed
    pub flush_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            eta_tick: Duration::from_secs(1),
            checkpoint_interval: Duration::from_secs(30),
            autosave_debounce: Duration::from_secs(10),
            flush_interval: Duration::from_secs(1),
        }
    }
}

/// Command sent to a running session
#[derive(Debug)]
pub enum SessionCommand {
    /// Load a document and restore its saved position
    Open { document: DocumentId, text: String },
    Play,
    Pause,
    /// Pause while speaking, play otherwise
    TogglePlay,
    Stop,
    Reset,
    Seek(usize),
    Next,
    Previous,
    SetVoice(VoiceParamsUpdate),
    SetMeditation(bool),
    SetMeditationPause(f64),
    SetEtaRequested(bool),
    RefreshVoices,
    /// Reply with the current status
    Status(oneshot::Sender<ReaderStatus>),
    /// Close the controller, flush pending saves and stop the task
    Close(oneshot::Sender<()>),
}

/// Cloneable handle to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    events: broadcast::Sender<ReaderEvent>,
}

impl SessionHandle {
    /// Send a raw command
    pub fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Closed)
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    pub fn open(&self, document: DocumentId, text: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::Open {
            document,
            text: text.into(),
        })
    }

    pub fn play(&self) -> Result<()> {
        self.send(SessionCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause)
    }

    pub fn toggle_play(&self) -> Result<()> {
        self.send(SessionCommand::TogglePlay)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(SessionCommand::Stop)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(SessionCommand::Reset)
    }

    pub fn seek(&self, index: usize) -> Result<()> {
        self.send(SessionCommand::Seek(index))
    }

    pub fn next(&self) -> Result<()> {
        self.send(SessionCommand::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(SessionCommand::Previous)
    }

    pub fn set_voice(&self, update: VoiceParamsUpdate) -> Result<()> {
        self.send(SessionCommand::SetVoice(update))
    }

    pub fn set_meditation(&self, enabled: bool) -> Result<()> {
        self.send(SessionCommand::SetMeditation(enabled))
    }

    pub fn set_meditation_pause(&self, secs: f64) -> Result<()> {
        self.send(SessionCommand::SetMeditationPause(secs))
    }

    pub fn set_eta_requested(&self, requested: bool) -> Result<()> {
        self.send(SessionCommand::SetEtaRequested(requested))
    }

    pub fn refresh_voices(&self) -> Result<()> {
        self.send(SessionCommand::RefreshVoices)
    }

    /// Current status of the controller
    pub async fn status(&self) -> Result<ReaderStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Status(tx))?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Close the session and wait until pending saves are flushed
    pub async fn close(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Close(tx))?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// What woke the session loop
enum Input {
    Command(SessionCommand),
    Engine(EngineEvent),
    Timer(TimerToken),
    EtaTick,
    Checkpoint,
    Flush,
    /// Every handle was dropped
    Detached,
}

/// Task state of a running session
pub struct ReaderSession {
    controller: ReadingController,
    store: Arc<dyn PositionStore>,
    autosave: AutosavePolicy,
    events: broadcast::Sender<ReaderEvent>,
    clock: TokioClock,
    retry_delay: Duration,
}

impl ReaderSession {
    /// Spawn a session on the current runtime
    ///
    /// `engine_events` must be the receiver the engine reports on.
    pub fn start(
        engine: Box<dyn SpeechEngine>,
        engine_events: mpsc::UnboundedReceiver<EngineEvent>,
        store: Arc<dyn PositionStore>,
        settings: ControllerSettings,
        config: SessionConfig,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let (scheduler, timers) = TokioScheduler::new();
        let controller =
            ReadingController::new(engine, Box::new(scheduler), Box::new(TokioClock), settings);

        let session = Self {
            controller,
            store,
            autosave: AutosavePolicy::new(config.autosave_debounce),
            events: events.clone(),
            clock: TokioClock,
            retry_delay: config.autosave_debounce,
        };

        let task = tokio::spawn(session.run(commands, engine_events, timers, config));
        let handle = SessionHandle {
            commands: commands_tx,
            events,
        };

        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut engine_events: mpsc::UnboundedReceiver<EngineEvent>,
        mut timers: mpsc::UnboundedReceiver<TimerToken>,
        config: SessionConfig,
    ) {
        let mut eta_tick = interval(config.eta_tick);
        let mut checkpoint = interval(config.checkpoint_interval);
        let mut flush = interval(config.flush_interval);

        // Constructor may already have reported voice selection or errors
        self.pump().await;

        loop {
            let input = tokio::select! {
                command = commands.recv() => command.map_or(Input::Detached, Input::Command),
                Some(event) = engine_events.recv() => Input::Engine(event),
                Some(token) = timers.recv() => Input::Timer(token),
                _ = eta_tick.tick() => Input::EtaTick,
                _ = checkpoint.tick() => Input::Checkpoint,
                _ = flush.tick() => Input::Flush,
            };

            match input {
                Input::Detached => {
                    debug!("All session handles dropped");
                    self.shutdown().await;
                    break;
                }
                Input::Command(command) => {
                    if self.handle_command(command).await.is_break() {
                        break;
                    }
                }
                Input::Engine(event) => self.controller.handle_engine_event(event),
                Input::Timer(token) => self.controller.handle_timer(token),
                Input::EtaTick => self.controller.tick(),
                Input::Checkpoint => self.controller.checkpoint(),
                Input::Flush => {}
            }

            self.pump().await;
            self.flush_due().await;
        }

        info!("Reading session stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) -> ControlFlow<()> {
        match command {
            SessionCommand::Open { document, text } => self.open(document, &text).await,
            SessionCommand::Play => self.controller.play(),
            SessionCommand::Pause => self.controller.pause(),
            SessionCommand::TogglePlay => {
                if self.controller.state() == ReaderState::Speaking {
                    self.controller.pause();
                } else {
                    self.controller.play();
                }
            }
            SessionCommand::Stop => self.controller.stop(),
            SessionCommand::Reset => self.controller.reset(),
            SessionCommand::Seek(index) => self.controller.seek(index),
            SessionCommand::Next => self.controller.next(),
            SessionCommand::Previous => self.controller.previous(),
            SessionCommand::SetVoice(update) => self.controller.set_voice_params(update),
            SessionCommand::SetMeditation(enabled) => self.controller.set_meditation_mode(enabled),
            SessionCommand::SetMeditationPause(secs) => {
                self.controller.set_meditation_pause_seconds(secs);
            }
            SessionCommand::SetEtaRequested(requested) => {
                self.controller.set_eta_requested(requested);
            }
            SessionCommand::RefreshVoices => self.controller.refresh_voices(),
            SessionCommand::Status(reply) => {
                let _ = reply.send(self.controller.status());
            }
            SessionCommand::Close(ack) => {
                self.shutdown().await;
                let _ = ack.send(());
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    async fn open(&mut self, document: DocumentId, text: &str) {
        // Leave the previous document through the normal close path
        if self.controller.document().is_some() {
            self.controller.close();
            self.pump().await;
            self.flush_all().await;
        }

        self.controller.open_document(document.clone(), text);
        self.pump().await;

        match self.store.load(&document).await {
            Ok(Some(snapshot)) => {
                if self.controller.restore(&snapshot) {
                    info!(
                        "Resuming {} at sentence {}",
                        document,
                        self.controller.cursor() + 1
                    );
                }
                self.autosave.mark_saved(snapshot);
            }
            Ok(None) => debug!("No saved position for {}", document),
            Err(e) => {
                warn!("Failed to load position for {}: {}", document, e);
                self.publish(ReaderEvent::Error {
                    error: PlaybackError::from(e),
                });
            }
        }
    }

    /// Publish controller events and route persistence requests
    async fn pump(&mut self) {
        let now = self.clock.now();
        let mut cleared = Vec::new();

        for event in self.controller.drain_events() {
            match &event {
                ReaderEvent::PersistRequested { trigger, snapshot } => {
                    self.autosave.request(*trigger, snapshot.clone(), now);
                }
                ReaderEvent::SnapshotCleared { document } => {
                    self.autosave.clear(document);
                    cleared.push(document.clone());
                }
                _ => {}
            }
            self.publish(event);
        }

        for document in cleared {
            if let Err(e) = self.store.clear(&document).await {
                warn!("Failed to clear position for {}: {}", document, e);
                self.publish(ReaderEvent::Error {
                    error: PlaybackError::from(e),
                });
            }
        }
    }

    async fn flush_due(&mut self) {
        let now = self.clock.now();
        if let Some(snapshot) = self.autosave.take_due(now) {
            self.save(snapshot).await;
        }
    }

    async fn flush_all(&mut self) {
        if let Some(snapshot) = self.autosave.take_any() {
            self.save(snapshot).await;
        }
    }

    async fn save(&mut self, snapshot: PositionSnapshot) {
        match self.store.save(&snapshot).await {
            Ok(()) => {
                debug!(
                    "Saved {} at sentence {}",
                    snapshot.document_identity, snapshot.sentence_index
                );
                self.autosave.mark_saved(snapshot);
            }
            Err(e) => {
                warn!(
                    "Failed to save position for {}: {}",
                    snapshot.document_identity, e
                );
                let retry_at = self.clock.now() + self.retry_delay;
                self.autosave.mark_failed(snapshot, retry_at);
                self.publish(ReaderEvent::Error {
                    error: PlaybackError::from(e),
                });
            }
        }
    }

    async fn shutdown(&mut self) {
        self.controller.close();
        self.pump().await;
        self.flush_all().await;
    }

    fn publish(&self, event: ReaderEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for ReaderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderSession")
            .field("controller", &self.controller)
            .field("autosave", &self.autosave)
            .finish_non_exhaustive()
    }
}

fn interval(period: Duration) -> Interval {
    let period = period.max(MIN_INTERVAL);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
