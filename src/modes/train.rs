//! Training mode for the DQN agent
//!
//! Runs the two-phase schedule over a set of user mazes:
//!
//! 1. **Sequential**: the first episodes (two by default) run one step at a
//!    time with a `step` event and a pacing pause after every step, so a
//!    client can watch the agent explore.
//! 2. **Batched**: the remaining budget runs on up to eight environment
//!    slots stepped together, one batched action selection per tick. Finished
//!    slots are finalized and respawned inline.
//!
//! Every episode end blends the target network, decays ε and checks the
//! early-stopping window. The run finishes with a greedy path per maze.
//!
//! # Example
//!
//! ```rust,ignore
//! use ml_maze::modes::{TrainConfig, Trainer};
//! use ml_maze::rl::{DqnAgent, HyperParams, TrainingBackend, default_device};
//! use ml_maze::worker::{CancelToken, EventSink};
//!
//! let hyper_params = HyperParams::default();
//! let mut agent = DqnAgent::<TrainingBackend>::new(hyper_params.agent_config(area), default_device())?;
//! let trainer = Trainer::new(TrainConfig::new(hyper_params));
//!
//! let (events, _rx) = EventSink::channel();
//! let outcome = trainer.run(&mut agent, &mazes, &events, &CancelToken::new()).await?;
//! ```

use burn::tensor::backend::AutodiffBackend;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{RunOutcome, pace};
use crate::error::EngineError;
use crate::maze::{Cell, MazeConfig, validate_maze};
use crate::metrics::{EarlyStopWindow, TrainingStats, round_to};
use crate::rl::{DqnAgent, HyperParams, MazeEnvironment, Observation, RolloutTracker};
use crate::worker::{CancelToken, EngineEvent, EventSink};

/// Outcome of one training episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub episode: usize,
    pub maze_index: usize,
    pub total_steps: usize,
    pub reached_goal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sequential,
    Batched,
}

/// Episode index at which a phase began
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMarker {
    pub phase: Phase,
    pub first_episode: usize,
}

/// Everything a completed training run produced
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSession {
    pub episodes: Vec<EpisodeResult>,
    pub phases: Vec<PhaseMarker>,
    pub converged: bool,
    /// Greedy path per training maze, in input order
    pub final_paths: Vec<Vec<Cell>>,
}

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Episode budget, revisit penalty and (for new agents) network settings
    pub hyper_params: HyperParams,

    /// Pause after every sequential-phase step
    ///
    /// Default: 20 ms
    pub step_delay: Duration,

    /// Episodes run one at a time before batching
    ///
    /// Default: 2
    pub sequential_episodes: usize,

    /// Environment slots stepped together in the batched phase
    ///
    /// Default: 8
    pub parallel_slots: usize,

    /// Call `learn()` once every this many steps (sequential) or ticks (batched)
    ///
    /// Default: 4
    pub learn_every: usize,

    /// Batched ticks between progress events and cooperative yields
    ///
    /// Default: 50
    pub yield_every: usize,

    /// Episodes in the early-stopping window
    ///
    /// Default: 30
    pub early_stop_window: usize,
}

impl TrainConfig {
    /// Create a new training configuration with default pacing
    pub fn new(hyper_params: HyperParams) -> Self {
        Self {
            hyper_params,
            step_delay: Duration::from_millis(20),
            sequential_episodes: 2,
            parallel_slots: 8,
            learn_every: 4,
            yield_every: 50,
            early_stop_window: 30,
        }
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.hyper_params.validate()?;

        if self.parallel_slots == 0 {
            return Err("parallel_slots must be at least 1".to_string());
        }
        if self.learn_every == 0 || self.yield_every == 0 {
            return Err("learn_every and yield_every must be at least 1".to_string());
        }

        Ok(())
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::new(HyperParams::default())
    }
}

/// Drives the two-phase training schedule for one run
pub struct Trainer {
    config: TrainConfig,
}

/// What the caller should do after an episode has been finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodeVerdict {
    Continue,
    Converged,
    BudgetSpent,
}

/// Mean of the losses returned since the last episode end
#[derive(Debug, Default)]
struct LossTally {
    sum: f32,
    count: usize,
}

impl LossTally {
    fn add(&mut self, loss: f32) {
        self.sum += loss;
        self.count += 1;
    }

    fn take_mean(&mut self) -> f32 {
        let mean = if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f32
        };
        *self = Self::default();
        mean
    }
}

/// One environment in the batched phase
struct Slot {
    env: MazeEnvironment,
    maze_index: usize,
    observation: Observation,
    steps: usize,
}

/// Mutable bookkeeping shared by both phases of a run
struct RunState<'a, B: AutodiffBackend> {
    agent: &'a mut DqnAgent<B>,
    events: &'a EventSink,
    mazes: &'a [MazeConfig],
    revisit_penalty: f32,
    max_episodes: usize,
    episodes: Vec<EpisodeResult>,
    early_stop: EarlyStopWindow,
    stats: TrainingStats,
    global_step: usize,
}

impl<B: AutodiffBackend> RunState<'_, B> {
    fn pick_maze(&self) -> usize {
        rand::thread_rng().gen_range(0..self.mazes.len())
    }

    fn spawn_slot(&self) -> Slot {
        let maze_index = self.pick_maze();
        let mut env = MazeEnvironment::new(self.mazes[maze_index].clone(), self.revisit_penalty);
        let observation = env.reset();
        Slot {
            env,
            maze_index,
            observation,
            steps: 0,
        }
    }

    fn record_loss(&mut self, loss: Option<f32>, tally: &mut LossTally) {
        if let Some(loss) = loss {
            tally.add(loss);
            self.stats.record_loss(loss);
        }
    }

    /// Close an episode: target update, ε decay, event, early-stop check
    fn finish_episode(
        &mut self,
        maze_index: usize,
        total_steps: usize,
        reached_goal: bool,
        avg_loss: f32,
    ) -> EpisodeVerdict {
        self.agent.soft_update();
        self.agent.decay_epsilon();

        let episode = self.episodes.len();
        self.events.send(EngineEvent::EpisodeEnd {
            episode,
            maze_index,
            total_steps,
            reached_goal,
            epsilon: round_to(self.agent.epsilon(), 4),
            avg_loss: round_to(avg_loss, 4),
        });
        debug!(
            episode,
            maze_index,
            total_steps,
            reached_goal,
            epsilon = self.agent.epsilon(),
            "episode finished"
        );

        self.episodes.push(EpisodeResult {
            episode,
            maze_index,
            total_steps,
            reached_goal,
        });
        self.stats.record_episode(total_steps, reached_goal);

        if self.early_stop.record(reached_goal, total_steps) {
            EpisodeVerdict::Converged
        } else if self.episodes.len() >= self.max_episodes {
            EpisodeVerdict::BudgetSpent
        } else {
            EpisodeVerdict::Continue
        }
    }
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train `agent` on `mazes` until the budget is spent, training converges
    /// or `cancel` is tripped
    ///
    /// Every maze is validated before the first episode. The per-episode step
    /// cap is `rows * cols * 4` of the first maze and applies to every maze.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoMazes`], [`EngineError::InvalidMaze`] with the
    /// validator's message, or [`EngineError::InvalidHyperParams`].
    pub async fn run<B: AutodiffBackend>(
        &self,
        agent: &mut DqnAgent<B>,
        mazes: &[MazeConfig],
        events: &EventSink,
        cancel: &CancelToken,
    ) -> Result<RunOutcome<TrainingSession>, EngineError> {
        self.config
            .validate()
            .map_err(EngineError::InvalidHyperParams)?;
        let first = mazes.first().ok_or(EngineError::NoMazes)?;
        for maze in mazes {
            validate_maze(maze).into_result()?;
        }

        let hyper_params = &self.config.hyper_params;
        let step_cap = first.step_cap();
        info!(
            mazes = mazes.len(),
            max_episodes = hyper_params.max_episodes,
            step_cap,
            epsilon = agent.epsilon(),
            "training started"
        );

        let mut state = RunState {
            agent,
            events,
            mazes,
            revisit_penalty: hyper_params.revisit_penalty,
            max_episodes: hyper_params.max_episodes,
            episodes: Vec::new(),
            early_stop: EarlyStopWindow::new(self.config.early_stop_window),
            stats: TrainingStats::new(100),
            global_step: 0,
        };
        let mut phases = Vec::new();
        let mut converged = false;

        // Phase 1: sequential, every step reported
        let sequential = self.config.sequential_episodes.min(state.max_episodes);
        if sequential > 0 {
            phases.push(PhaseMarker {
                phase: Phase::Sequential,
                first_episode: 0,
            });
        }
        for _ in 0..sequential {
            if cancel.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }

            let maze_index = state.pick_maze();
            let mut env = MazeEnvironment::new(mazes[maze_index].clone(), state.revisit_penalty);
            let mut observation = env.reset();
            let mut tracker = RolloutTracker::new(env.position(), step_cap, None);
            let mut losses = LossTally::default();

            while !tracker.status().is_finished() {
                if cancel.is_cancelled() {
                    return Ok(RunOutcome::Cancelled);
                }

                let action = state.agent.choose_action(&observation);
                let result = env.step(action);
                state.agent.store_transition(
                    &observation,
                    action,
                    result.reward,
                    &result.observation,
                    result.terminated,
                );

                state.global_step += 1;
                if state.global_step % self.config.learn_every == 0 {
                    let loss = state.agent.learn();
                    state.record_loss(loss, &mut losses);
                }

                tracker.record(env.position(), result.terminated);
                events.send(EngineEvent::Step {
                    episode: state.episodes.len(),
                    maze_index,
                    step: tracker.steps(),
                    position: env.position(),
                    action,
                    reward: round_to(result.reward, 3),
                });
                pace(self.config.step_delay).await;

                observation = result.observation;
            }

            let verdict = state.finish_episode(
                maze_index,
                tracker.steps(),
                tracker.status().reached_goal(),
                losses.take_mean(),
            );
            if verdict == EpisodeVerdict::Converged {
                converged = true;
                break;
            }
        }

        // Phase 2: batched slots
        if !converged && state.episodes.len() < state.max_episodes {
            let slot_count = self
                .config
                .parallel_slots
                .min(state.max_episodes - state.episodes.len());
            phases.push(PhaseMarker {
                phase: Phase::Batched,
                first_episode: state.episodes.len(),
            });

            let mut slots: Vec<Slot> = (0..slot_count).map(|_| state.spawn_slot()).collect();
            let mut losses = LossTally::default();

            'ticks: loop {
                if cancel.is_cancelled() {
                    return Ok(RunOutcome::Cancelled);
                }

                let observations: Vec<Observation> =
                    slots.iter().map(|slot| slot.observation).collect();
                let actions = state.agent.choose_action_batch(&observations);

                for (slot, action) in slots.iter_mut().zip(actions) {
                    let result = slot.env.step(action);
                    state.agent.store_transition(
                        &slot.observation,
                        action,
                        result.reward,
                        &result.observation,
                        result.terminated,
                    );
                    slot.observation = result.observation;
                    slot.steps += 1;

                    if result.terminated || slot.steps >= step_cap {
                        let verdict = state.finish_episode(
                            slot.maze_index,
                            slot.steps,
                            result.terminated,
                            losses.take_mean(),
                        );
                        match verdict {
                            EpisodeVerdict::Converged => {
                                converged = true;
                                break 'ticks;
                            }
                            EpisodeVerdict::BudgetSpent => break 'ticks,
                            EpisodeVerdict::Continue => *slot = state.spawn_slot(),
                        }
                    }
                }

                state.global_step += 1;
                if state.global_step % self.config.learn_every == 0 {
                    let loss = state.agent.learn();
                    state.record_loss(loss, &mut losses);
                }

                if state.global_step % self.config.yield_every == 0 {
                    let lead = &slots[0];
                    events.send(EngineEvent::Step {
                        episode: state.episodes.len(),
                        maze_index: lead.maze_index,
                        step: lead.steps,
                        position: lead.env.position(),
                        action: 0,
                        reward: 0.0,
                    });
                    tokio::task::yield_now().await;
                }
            }
        }

        let final_paths: Vec<Vec<Cell>> = mazes
            .iter()
            .map(|maze| {
                let mut env = MazeEnvironment::new(maze.clone(), state.revisit_penalty);
                state.agent.greedy_path(&mut env)
            })
            .collect();

        let total_episodes = state.episodes.len();
        events.send(EngineEvent::TrainingDone {
            total_episodes,
            final_paths: final_paths.clone(),
            converged,
        });
        info!(
            total_episodes,
            converged,
            learn_steps = state.agent.learn_steps(),
            "training finished: {}",
            state.stats.format_summary()
        );

        Ok(RunOutcome::Completed(TrainingSession {
            episodes: state.episodes,
            phases,
            converged,
            final_paths,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::network::goal_seeking_network;
    use crate::rl::{DqnConfig, TrainingBackend, default_device};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn hyper_params(max_episodes: usize) -> HyperParams {
        HyperParams {
            max_episodes,
            hidden_size: 16,
            ..HyperParams::default()
        }
    }

    fn fast_trainer(max_episodes: usize) -> Trainer {
        Trainer::new(TrainConfig::new(hyper_params(max_episodes)).with_step_delay(Duration::ZERO))
    }

    fn agent_for(mazes: &[MazeConfig]) -> DqnAgent<TrainingBackend> {
        let config = hyper_params(1).agent_config(mazes[0].area());
        DqnAgent::new(config, default_device()).unwrap()
    }

    fn drain(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_train_config_defaults() {
        let config = TrainConfig::default();
        assert_eq!(config.step_delay, Duration::from_millis(20));
        assert_eq!(config.sequential_episodes, 2);
        assert_eq!(config.parallel_slots, 8);
        assert_eq!(config.learn_every, 4);
        assert_eq!(config.early_stop_window, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_loss_tally_resets() {
        let mut tally = LossTally::default();
        assert_eq!(tally.take_mean(), 0.0);

        tally.add(0.2);
        tally.add(0.4);
        assert!((tally.take_mean() - 0.3).abs() < 1e-6);
        assert_eq!(tally.take_mean(), 0.0);
    }

    #[tokio::test]
    async fn test_no_mazes_rejected() {
        let mazes = [MazeConfig::new(3, 3)];
        let mut agent = agent_for(&mazes);
        let (events, _rx) = EventSink::channel();

        let result = fast_trainer(5)
            .run(&mut agent, &[], &events, &CancelToken::new())
            .await;
        assert!(matches!(result, Err(EngineError::NoMazes)));
    }

    #[tokio::test]
    async fn test_invalid_maze_fails_before_any_episode() {
        let good = MazeConfig::new(3, 3);
        let blocked = MazeConfig::new(3, 3).with_walls([Cell::new(2, 2)]);
        let mazes = [good, blocked];
        let mut agent = agent_for(&mazes);
        let (events, mut rx) = EventSink::channel();

        let err = fast_trainer(5)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "goal cell is a wall");
        assert!(drain(&mut rx).is_empty());
        assert_eq!(agent.episodes_trained(), 0);
    }

    #[tokio::test]
    async fn test_blocked_row_fails_before_any_episode() {
        let blocked = MazeConfig::new(3, 3).with_walls((0..3).map(|col| Cell::new(1, col)));
        let mazes = [MazeConfig::new(3, 3), blocked];
        let mut agent = agent_for(&mazes);
        let (events, mut rx) = EventSink::channel();

        let err = fast_trainer(5)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::InvalidMaze(_)));
        assert_eq!(err.to_string(), "no road connects start to goal");
        assert!(drain(&mut rx).is_empty());
        assert_eq!(agent.episodes_trained(), 0);
        assert_eq!(agent.buffer_len(), 0);
    }

    #[tokio::test]
    async fn test_early_stop_halts_before_budget() {
        // Greedy hand-wired policy solves the open 3x3 maze in 4 steps every
        // episode; the batch size keeps learn() from touching it.
        let config = DqnConfig {
            hidden_size: 16,
            epsilon_start: 0.0,
            epsilon_end: 0.0,
            batch_size: 64,
            buffer_capacity: 1_000,
            ..DqnConfig::default()
        };
        let mut agent = DqnAgent::<TrainingBackend>::new(config, default_device()).unwrap();
        agent.set_policy(goal_seeking_network(16, agent.device()));

        let mut train_config = TrainConfig::new(hyper_params(20)).with_step_delay(Duration::ZERO);
        train_config.early_stop_window = 3;
        let mazes = [MazeConfig::new(3, 3)];
        let (events, mut rx) = EventSink::channel();

        let session = Trainer::new(train_config)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert!(session.converged);
        assert_eq!(session.episodes.len(), 3);
        assert!(
            session
                .episodes
                .iter()
                .all(|ep| ep.reached_goal && ep.total_steps == 4)
        );
        assert_eq!(agent.episodes_trained(), 3);
        assert_eq!(agent.learn_steps(), 0);

        let done = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::TrainingDone {
                    total_episodes,
                    converged,
                    ..
                } => Some((total_episodes, converged)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(done, vec![(3, true)]);
    }

    #[tokio::test]
    async fn test_batched_phase_learns_every_fourth_tick() {
        let config = DqnConfig {
            hidden_size: 16,
            batch_size: 1,
            buffer_capacity: 1_000,
            ..DqnConfig::default()
        };
        let mut agent = DqnAgent::<TrainingBackend>::new(config, default_device()).unwrap();

        let mut train_config = TrainConfig::new(hyper_params(3)).with_step_delay(Duration::ZERO);
        train_config.sequential_episodes = 0;
        train_config.parallel_slots = 1;
        let mazes = [MazeConfig::new(3, 3)];
        let (events, mut rx) = EventSink::channel();

        let session = Trainer::new(train_config)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(
            session.phases,
            vec![PhaseMarker {
                phase: Phase::Batched,
                first_episode: 0
            }]
        );

        // One slot steps once per tick; the tick that spends the budget ends
        // the run before it is counted.
        let total_steps: usize = session.episodes.iter().map(|ep| ep.total_steps).sum();
        assert_eq!(agent.buffer_len(), total_steps);
        let counted_ticks = total_steps - 1;
        assert_eq!(agent.learn_steps(), counted_ticks / 4);
        assert!(agent.learn_steps() >= 2);

        let losses: Vec<f32> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::EpisodeEnd { avg_loss, .. } => Some(avg_loss),
                _ => None,
            })
            .collect();
        assert_eq!(losses.len(), 3);
        assert!(losses.iter().all(|loss| loss.is_finite() && *loss >= 0.0));
    }

    #[tokio::test]
    async fn test_single_episode_run() {
        let mazes = [MazeConfig::new(3, 3)];
        let mut agent = agent_for(&mazes);
        let (events, mut rx) = EventSink::channel();

        let session = fast_trainer(1)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(session.episodes.len(), 1);
        assert_eq!(
            session.phases,
            vec![PhaseMarker {
                phase: Phase::Sequential,
                first_episode: 0
            }]
        );
        assert_eq!(session.final_paths.len(), 1);
        assert_eq!(session.final_paths[0][0], Cell::new(0, 0));
        assert!(session.final_paths[0].len() - 1 <= 2 * 9);

        let events = drain(&mut rx);
        let steps = events
            .iter()
            .filter(|event| matches!(event, EngineEvent::Step { .. }))
            .count();
        assert_eq!(steps, session.episodes[0].total_steps);
        assert!(matches!(
            events.last(),
            Some(EngineEvent::TrainingDone {
                total_episodes: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_budget_spans_both_phases() {
        let mazes = [MazeConfig::new(3, 3), MazeConfig::new(3, 4)];
        let mut agent = agent_for(&mazes);
        let (events, mut rx) = EventSink::channel();

        let session = fast_trainer(12)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert!(!session.converged);
        assert_eq!(session.episodes.len(), 12);
        assert_eq!(session.phases[1].phase, Phase::Batched);
        assert_eq!(session.phases[1].first_episode, 2);
        assert_eq!(agent.episodes_trained(), 12);

        let ends: Vec<usize> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::EpisodeEnd { episode, .. } => Some(episode),
                _ => None,
            })
            .collect();
        assert_eq!(ends, (0..12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_epsilon_reported_after_decay() {
        let mazes = [MazeConfig::new(3, 3)];
        let mut agent = agent_for(&mazes);
        let (events, mut rx) = EventSink::channel();

        fast_trainer(3)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap();

        let epsilons: Vec<f32> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::EpisodeEnd { epsilon, .. } => Some(epsilon),
                _ => None,
            })
            .collect();
        assert_eq!(epsilons.len(), 3);
        assert!(epsilons[0] < 1.0);
        assert!(epsilons.windows(2).all(|pair| pair[1] < pair[0]));
        assert_eq!(*epsilons.last().unwrap(), round_to(agent.epsilon(), 4));
    }

    #[tokio::test]
    async fn test_step_cap_comes_from_first_maze() {
        // The 1x2 maze caps every episode at 8 steps, far below the 18 the
        // open 10x10 maze needs, so episodes there can never succeed.
        let mazes = [MazeConfig::new(1, 2), MazeConfig::new(10, 10)];
        let mut agent = agent_for(&mazes);
        let (events, _rx) = EventSink::channel();

        let session = fast_trainer(40)
            .run(&mut agent, &mazes, &events, &CancelToken::new())
            .await
            .unwrap()
            .completed()
            .unwrap();

        assert!(session.episodes.iter().all(|ep| ep.total_steps <= 8));
        for episode in session.episodes.iter().filter(|ep| ep.maze_index == 1) {
            assert_eq!(episode.total_steps, 8);
            assert!(!episode.reached_goal);
        }
    }

    #[tokio::test]
    async fn test_cancelled_run_skips_done_event() {
        let mazes = [MazeConfig::new(3, 3)];
        let mut agent = agent_for(&mazes);
        let (events, mut rx) = EventSink::channel();
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = fast_trainer(5)
            .run(&mut agent, &mazes, &events, &cancel)
            .await
            .unwrap();

        assert!(outcome.is_cancelled());
        assert!(
            !drain(&mut rx)
                .iter()
                .any(|event| matches!(event, EngineEvent::TrainingDone { .. }))
        );
    }
}
