//! DQN (Deep Q-Network) agent implementation
//!
//! This module implements the DQN algorithm for the maze agent: ε-greedy
//! action selection (single and batched), experience replay, the Bellman
//! learning step against a target network, and the soft target update.

use super::buffer::{ReplayBuffer, Transition};
use super::config::DqnConfig;
use super::environment::MazeEnvironment;
use super::exploration::EpsilonSchedule;
use super::network::{NUM_ACTIONS, QNetwork, QNetworkConfig};
use super::observation::{Observation, observation_batch};
use super::rollout::{RolloutTracker, STUCK_LIMIT};
use crate::error::EngineError;
use crate::maze::Cell;
use burn::{
    module::{AutodiffModule, Module},
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
    tensor::{ElementConversion, Tensor, TensorData, backend::AutodiffBackend},
};
use rand::Rng;

/// DQN agent for the maze environment
///
/// Owns the policy network (trained through autodiff), the target network
/// (inference backend, updated only by [`DqnAgent::soft_update`]), the replay
/// buffer and the exploration schedule.
///
/// # Type Parameters
///
/// * `B` - Autodiff backend for gradient computation
///
/// # Example
///
/// ```rust,ignore
/// use ml_maze::rl::{DqnAgent, DqnConfig, TrainingBackend, default_device};
///
/// let agent = DqnAgent::<TrainingBackend>::new(DqnConfig::default(), default_device())?;
/// ```
pub struct DqnAgent<B: AutodiffBackend> {
    /// Network being trained
    policy: QNetwork<B>,

    /// Slowly tracking copy used for Bellman targets
    target: QNetwork<B::InnerBackend>,

    /// Adam optimizer for policy parameters
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,

    /// Hyperparameters, immutable after construction
    config: DqnConfig,

    /// Experience replay
    buffer: ReplayBuffer,

    /// ε-greedy schedule
    exploration: EpsilonSchedule,

    /// Gradient steps taken
    learn_steps: usize,

    /// Completed episodes across every session
    episodes_trained: usize,

    /// Device for tensor operations
    device: B::Device,
}

impl<B: AutodiffBackend> DqnAgent<B> {
    /// Create a new agent with freshly initialized networks
    ///
    /// The target network starts as an exact copy of the policy network.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidHyperParams`] when `config` fails validation.
    pub fn new(config: DqnConfig, device: B::Device) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidHyperParams)?;

        let policy = QNetworkConfig::new(config.hidden_size).init::<B>(&device);
        let target = policy.valid();
        let exploration = EpsilonSchedule::new(
            config.epsilon_start,
            config.epsilon_end,
            config.epsilon_decay_episodes,
        );

        Ok(Self {
            policy,
            target,
            optim: AdamConfig::new().init(),
            buffer: ReplayBuffer::new(config.buffer_capacity),
            exploration,
            config,
            learn_steps: 0,
            episodes_trained: 0,
            device,
        })
    }

    /// Policy action values for a batch of observations, row-major `[n, 4]`
    fn q_values(&self, observations: &[Observation]) -> Vec<f32> {
        let network = self.policy.valid();
        let input = observation_batch::<B::InnerBackend>(observations, &self.device);
        network.forward(input).into_data().iter::<f32>().collect()
    }

    /// ε-greedy action for one observation
    pub fn choose_action(&self, observation: &Observation) -> usize {
        let mut rng = rand::thread_rng();
        if rng.r#gen::<f32>() < self.exploration.epsilon() {
            rng.gen_range(0..NUM_ACTIONS)
        } else {
            self.greedy_action(observation)
        }
    }

    /// ε-greedy actions for a batch of observations
    ///
    /// One forward pass covers the whole batch; ε is shared but each item
    /// draws independently.
    pub fn choose_action_batch(&self, observations: &[Observation]) -> Vec<usize> {
        if observations.is_empty() {
            return Vec::new();
        }

        let q = self.q_values(observations);
        let epsilon = self.exploration.epsilon();
        let mut rng = rand::thread_rng();

        q.chunks(NUM_ACTIONS)
            .map(|row| {
                if rng.r#gen::<f32>() < epsilon {
                    rng.gen_range(0..NUM_ACTIONS)
                } else {
                    argmax(row)
                }
            })
            .collect()
    }

    /// Greedy (ε = 0) action
    pub fn greedy_action(&self, observation: &Observation) -> usize {
        self.greedy_action_with_q(observation).0
    }

    /// Greedy action together with the raw action values
    ///
    /// The values are for diagnostics and display only.
    pub fn greedy_action_with_q(&self, observation: &Observation) -> (usize, [f32; NUM_ACTIONS]) {
        let q = self.q_values(std::slice::from_ref(observation));
        let mut values = [0.0; NUM_ACTIONS];
        for (slot, value) in values.iter_mut().zip(q) {
            *slot = value;
        }
        (argmax(&values), values)
    }

    /// Store a transition in the replay buffer
    ///
    /// Observations are copied by value.
    pub fn store_transition(
        &mut self,
        observation: &Observation,
        action: usize,
        reward: f32,
        next_observation: &Observation,
        done: bool,
    ) {
        self.buffer.push(Transition {
            observation: *observation,
            action,
            reward,
            next_observation: *next_observation,
            done,
        });
    }

    /// Perform one DQN update
    ///
    /// Samples `batch_size` transitions with replacement and minimizes
    /// `(Q(s, a) - (r + γ (1 - done) max_a' Q_target(s', a')))²` over the taken
    /// actions only.
    ///
    /// # Returns
    ///
    /// The batch loss, or `None` while the buffer holds fewer than
    /// `batch_size` transitions.
    pub fn learn(&mut self) -> Option<f32> {
        let batch_size = self.config.batch_size;
        if self.buffer.len() < batch_size {
            return None;
        }
        let batch = self.buffer.sample(batch_size, &mut rand::thread_rng())?;

        // Bellman targets from the target network
        let next_obs: Tensor<B::InnerBackend, 2> =
            Tensor::from_data(batch.next_observations, &self.device);
        let max_next_q: Vec<f32> = self
            .target
            .forward(next_obs)
            .max_dim(1)
            .into_data()
            .iter::<f32>()
            .collect();
        let targets: Vec<f32> = (0..batch_size)
            .map(|i| {
                batch.rewards[i] + self.config.gamma * (1.0 - batch.dones[i]) * max_next_q[i]
            })
            .collect();
        let targets: Tensor<B, 1> =
            Tensor::from_data(TensorData::new(targets, [batch_size]), &self.device);

        // One-hot mask selecting Q(s, a) for the taken action
        let mut mask = vec![0.0f32; batch_size * NUM_ACTIONS];
        for (i, &action) in batch.actions.iter().enumerate() {
            mask[i * NUM_ACTIONS + action] = 1.0;
        }
        let mask: Tensor<B, 2> = Tensor::from_data(
            TensorData::new(mask, [batch_size, NUM_ACTIONS]),
            &self.device,
        );

        let observations: Tensor<B, 2> = Tensor::from_data(batch.observations, &self.device);
        let action_q = (self.policy.forward(observations) * mask)
            .sum_dim(1)
            .squeeze::<1>(1);

        let diff = action_q - targets;
        let loss = (diff.clone() * diff).mean();
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        let grads = GradientsParams::from_grads(loss.backward(), &self.policy);
        self.policy = self
            .optim
            .step(self.config.learning_rate, self.policy.clone(), grads);
        self.learn_steps += 1;

        Some(loss_value)
    }

    /// Blend the policy into the target network: `target ← τ·policy + (1−τ)·target`
    pub fn soft_update(&mut self) {
        let policy = self.policy.valid();
        self.target = self.target.clone().soft_update(&policy, self.config.tau);
    }

    /// Advance the exploration schedule by one completed episode
    pub fn decay_epsilon(&mut self) {
        self.exploration.decay();
        self.episodes_trained += 1;
    }

    /// Raise ε again before training on new content, keeping learned weights
    pub fn reset_exploration(&mut self, value: f32) {
        self.exploration.reset_to(value);
    }

    /// Cells visited by the greedy policy from a fresh reset
    ///
    /// Stops at the goal, after `2 × rows × cols` steps, or once any cell has
    /// been visited ten times. Agent state is not modified.
    pub fn greedy_path(&self, env: &mut MazeEnvironment) -> Vec<Cell> {
        let mut observation = env.reset();
        let step_cap = 2 * env.maze().area();
        let mut tracker = RolloutTracker::new(env.position(), step_cap, Some(STUCK_LIMIT));

        while !tracker.status().is_finished() {
            let result = env.step(self.greedy_action(&observation));
            observation = result.observation;
            tracker.record(env.position(), result.terminated);
        }

        tracker.into_path()
    }

    /// Serialize the policy weights to an opaque byte blob
    pub fn serialize(&self) -> Result<Vec<u8>, EngineError> {
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
        recorder
            .record(self.policy.clone().into_record(), ())
            .map_err(|err| EngineError::Model(err.to_string()))
    }

    /// Load policy weights produced by [`DqnAgent::serialize`]
    ///
    /// The target network becomes an exact copy of the loaded policy and the
    /// optimizer state is reset. On error the agent is left unchanged.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
        let record = recorder
            .load(bytes.to_vec(), &self.device)
            .map_err(|err| EngineError::Model(err.to_string()))?;

        self.policy = self.policy.clone().load_record(record);
        self.target = self.policy.valid();
        self.optim = AdamConfig::new().init();
        Ok(())
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon()
    }

    /// Get a reference to the DQN configuration
    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Number of transitions in the replay buffer
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn learn_steps(&self) -> usize {
        self.learn_steps
    }

    pub fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    /// Restore the episode counter after loading saved weights
    pub fn set_episodes_trained(&mut self, episodes: usize) {
        self.episodes_trained = episodes;
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    #[cfg(test)]
    pub(crate) fn set_policy(&mut self, policy: QNetwork<B>) {
        self.target = policy.valid();
        self.policy = policy;
    }

    #[cfg(test)]
    pub(crate) fn target_q_values(&self, observation: &Observation) -> Vec<f32> {
        let input =
            observation_batch::<B::InnerBackend>(std::slice::from_ref(observation), &self.device);
        self.target.forward(input).into_data().iter::<f32>().collect()
    }
}

/// Index of the largest value; ties resolve to the lowest index
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}
