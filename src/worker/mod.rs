//! Command loop that owns the agent and runs one job at a time
//!
//! A [`Worker`] receives [`Command`]s, runs training and evaluation jobs, and
//! reports progress as [`EngineEvent`]s. While a job runs, the worker keeps
//! listening: `stop` cancels the job, `reset` cancels it and discards the
//! agent, and any other command is rejected with an `error` event.

pub mod channel;
pub mod command;
pub mod event;
pub mod slot;

pub use channel::{CancelToken, EventSink};
pub use command::Command;
pub use event::{EngineEvent, TestSummary};
pub use slot::AgentSlot;

use burn::backend::ndarray::NdArrayDevice;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::maze::{MazeConfig, validate_maze};
use crate::metrics::Score;
use crate::modes::{EpisodeResult, EvalConfig, Evaluator, RunOutcome, TrainConfig, Trainer};
use crate::rl::{
    DEFAULT_RESUME_EPSILON, DqnAgent, HyperParams, ModelStore, SlotMetadata, TrainingBackend,
    default_device,
};

/// Settings for a [`Worker`]
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory holding the model slots
    pub model_dir: PathBuf,

    /// Pause after each sequential training step (default: 20 ms)
    pub train_step_delay: Duration,

    /// Pause after each evaluation step (default: 30 ms)
    pub eval_step_delay: Duration,
}

impl WorkerConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            train_step_delay: Duration::from_millis(20),
            eval_step_delay: Duration::from_millis(30),
        }
    }

    /// Drop every pacing pause
    pub fn fast(mut self) -> Self {
        self.train_step_delay = Duration::ZERO;
        self.eval_step_delay = Duration::ZERO;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("models")
    }
}

/// Owner of the agent and its training history
pub struct Worker {
    config: WorkerConfig,
    slot: AgentSlot<TrainingBackend>,
    store: ModelStore,
    events: EventSink,
    device: NdArrayDevice,

    /// Every episode result across sessions
    history: Vec<EpisodeResult>,
    /// Index into `history` where each session began
    session_boundaries: Vec<usize>,
    /// Mazes of the most recent training session
    mazes: Vec<MazeConfig>,
    last_score: Option<Score>,
}

impl Worker {
    pub fn new(config: WorkerConfig, events: EventSink) -> Self {
        let store = ModelStore::new(config.model_dir.clone());
        Self {
            config,
            slot: AgentSlot::Empty,
            store,
            events,
            device: default_device(),
            history: Vec::new(),
            session_boundaries: Vec::new(),
            mazes: Vec::new(),
            last_score: None,
        }
    }

    /// Whether an agent exists
    pub fn has_agent(&self) -> bool {
        self.slot.is_ready()
    }

    pub fn agent(&self) -> Option<&DqnAgent<TrainingBackend>> {
        self.slot.get()
    }

    pub fn history(&self) -> &[EpisodeResult] {
        &self.history
    }

    pub fn last_score(&self) -> Option<Score> {
        self.last_score
    }

    /// Process commands until the sender side is dropped
    pub async fn run(mut self, mut commands: UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command, &mut commands).await;
        }
        debug!("command channel closed, worker exiting");
    }

    /// Process one command
    ///
    /// Runs (`start_train`, `start_test`, `play`) are awaited here while
    /// `commands` is polled for `stop` and `reset`.
    pub async fn handle(&mut self, command: Command, commands: &mut UnboundedReceiver<Command>) {
        debug!(command = command.name(), "handling command");

        if command.is_run() {
            self.run_job(command, commands).await;
            return;
        }

        let result = match command {
            Command::Stop => {
                debug!("stop received with no active run");
                Ok(())
            }
            Command::Reset => {
                self.reset();
                Ok(())
            }
            Command::SaveModel { slot, name } => self.save_model(slot, name),
            Command::LoadModel { slot } => self.load_model(slot),
            Command::DeleteModel { slot } => self.store.delete(slot).map(|()| {
                self.events.send(EngineEvent::ModelDeleted { slot });
            }),
            Command::CopyModel { from, to } => self.store.copy(from, to).map(|_| {
                self.events.send(EngineEvent::ModelCopied { from, to });
            }),
            Command::ListModels => self.store.list().map(|slots| {
                self.events.send(EngineEvent::ModelList { slots });
            }),
            Command::StartTrain { .. } | Command::StartTest { .. } | Command::Play { .. } => Ok(()),
        };

        if let Err(err) = result {
            self.report(&err);
        }
    }

    async fn run_job(&mut self, command: Command, commands: &mut UnboundedReceiver<Command>) {
        let cancel = CancelToken::new();
        let events = self.events.clone();
        let mut discard_after = false;
        let mut listening = true;

        let result = {
            let job = self.execute(command, &cancel);
            tokio::pin!(job);

            loop {
                tokio::select! {
                    result = &mut job => break result,
                    received = commands.recv(), if listening => match received {
                        Some(Command::Stop) => {
                            info!("stop requested");
                            cancel.cancel();
                        }
                        Some(Command::Reset) => {
                            info!("reset requested during run");
                            cancel.cancel();
                            discard_after = true;
                        }
                        Some(other) => {
                            warn!(command = other.name(), "rejected while a run is active");
                            events.send(EngineEvent::error(&EngineError::Busy));
                        }
                        None => listening = false,
                    },
                }
            }
        };

        if let Err(err) = result {
            self.report(&err);
        }
        if discard_after {
            self.reset();
        }
    }

    async fn execute(&mut self, command: Command, cancel: &CancelToken) -> Result<(), EngineError> {
        match command {
            Command::StartTrain {
                mazes,
                hyper_params,
                fresh,
            } => self.train(mazes, hyper_params, fresh, cancel).await,
            Command::StartTest { rows, cols, count } => {
                let agent = self.slot.get().ok_or(EngineError::NoAgent)?;
                let evaluator =
                    Evaluator::new(EvalConfig::default().with_step_delay(self.config.eval_step_delay));
                let outcome = evaluator
                    .run_tests(agent, rows, cols, count, &self.events, cancel)
                    .await?;
                if let RunOutcome::Completed(report) = outcome {
                    self.last_score = Some(report.score);
                }
                Ok(())
            }
            Command::Play { maze } => {
                let agent = self.slot.get().ok_or(EngineError::NoAgent)?;
                let evaluator =
                    Evaluator::new(EvalConfig::default().with_step_delay(self.config.eval_step_delay));
                evaluator
                    .run_playground(agent, &maze, &self.events, cancel)
                    .await?;
                Ok(())
            }
            other => {
                debug!(command = other.name(), "not a run command");
                Ok(())
            }
        }
    }

    async fn train(
        &mut self,
        mazes: Vec<MazeConfig>,
        hyper_params: HyperParams,
        fresh: bool,
        cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        hyper_params
            .validate()
            .map_err(EngineError::InvalidHyperParams)?;
        let first = mazes.first().ok_or(EngineError::NoMazes)?;
        for maze in &mazes {
            validate_maze(maze).into_result()?;
        }

        let agent_config = hyper_params.agent_config(first.area());
        let device = self.device.clone();
        let (agent, reused) = self
            .slot
            .acquire(fresh, || DqnAgent::new(agent_config, device))?;

        if reused && agent.episodes_trained() > 0 {
            info!(
                episodes_trained = agent.episodes_trained(),
                epsilon = DEFAULT_RESUME_EPSILON,
                "continuing training on existing agent"
            );
            agent.reset_exploration(DEFAULT_RESUME_EPSILON);
        }

        let trainer = Trainer::new(
            TrainConfig::new(hyper_params).with_step_delay(self.config.train_step_delay),
        );
        let outcome = trainer.run(agent, &mazes, &self.events, cancel).await?;

        if fresh || !reused {
            self.history.clear();
            self.session_boundaries.clear();
        }
        match outcome {
            RunOutcome::Completed(session) => {
                self.session_boundaries.push(self.history.len());
                self.history.extend(session.episodes);
                self.mazes = mazes;
            }
            RunOutcome::Cancelled => info!("training stopped"),
        }
        Ok(())
    }

    fn save_model(&mut self, slot: usize, name: String) -> Result<(), EngineError> {
        let agent = self.slot.get().ok_or(EngineError::NoAgent)?;
        let weights = agent.serialize()?;

        let mut metadata =
            SlotMetadata::new(name.clone(), agent.config().clone(), agent.episodes_trained());
        metadata.session_boundaries = self.session_boundaries.clone();
        metadata.history = self.history.clone();
        metadata.mazes = self.mazes.clone();
        metadata.score = self.last_score;

        self.store.save(slot, &weights, &metadata)?;
        info!(slot, name = %name, "model saved");
        self.events.send(EngineEvent::ModelSaved { slot, name });
        Ok(())
    }

    /// Replace the live agent with the one stored in `slot`
    ///
    /// Any failure leaves the current agent and history untouched.
    fn load_model(&mut self, slot: usize) -> Result<(), EngineError> {
        let (weights, metadata) = self.store.load(slot)?;

        let mut agent = DqnAgent::new(metadata.config.clone(), self.device.clone())?;
        agent.deserialize(&weights)?;
        agent.set_episodes_trained(metadata.total_episodes);

        self.slot.replace(agent);
        self.history = metadata.history;
        self.session_boundaries = metadata.session_boundaries;
        self.mazes = metadata.mazes;
        self.last_score = metadata.score;

        info!(slot, name = %metadata.name, "model loaded");
        self.events.send(EngineEvent::ModelLoaded {
            slot,
            name: metadata.name,
            total_episodes: metadata.total_episodes,
        });
        Ok(())
    }

    fn reset(&mut self) {
        self.slot.discard();
        self.history.clear();
        self.session_boundaries.clear();
        self.mazes.clear();
        self.last_score = None;
        info!("agent discarded");
    }

    fn report(&self, err: &EngineError) {
        warn!(error = %err, "command failed");
        self.events.send(EngineEvent::error(err));
    }
}
