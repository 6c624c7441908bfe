//! Experience replay buffer for DQN
//!
//! A fixed-capacity ring of transitions. Once full, each insertion overwrites
//! the oldest entry, so eviction is strictly FIFO. Batches are drawn uniformly
//! with replacement.

use super::observation::{OBS_DIM, Observation};
use burn::tensor::TensorData;
use rand::Rng;

/// Lower bound on the replay capacity
pub const MIN_CAPACITY: usize = 50_000;
/// Upper bound on the replay capacity
pub const MAX_CAPACITY: usize = 150_000;

/// One (state, action, reward, next state, done) tuple, stored by value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub observation: Observation,
    pub action: usize,
    pub reward: f32,
    pub next_observation: Observation,
    pub done: bool,
}

/// A sampled minibatch laid out for tensor construction
#[derive(Debug, Clone)]
pub struct TransitionBatch {
    /// Observations `[batch, OBS_DIM]`
    pub observations: TensorData,
    /// Next observations `[batch, OBS_DIM]`
    pub next_observations: TensorData,
    pub actions: Vec<usize>,
    pub rewards: Vec<f32>,
    /// 1.0 for terminal transitions, 0.0 otherwise
    pub dones: Vec<f32>,
}

/// Ring buffer of transitions with FIFO eviction
///
/// # Example
///
/// ```rust
/// use ml_maze::rl::{Observation, ReplayBuffer, Transition};
///
/// let mut buffer = ReplayBuffer::new(2);
/// let transition = Transition {
///     observation: Observation::default(),
///     action: 1,
///     reward: -0.01,
///     next_observation: Observation::default(),
///     done: false,
/// };
/// buffer.push(transition);
/// buffer.push(transition);
/// buffer.push(transition);
///
/// assert_eq!(buffer.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    entries: Vec<Transition>,
    /// Slot the next insertion writes to once the buffer is full
    pos: usize,
    capacity: usize,
}

impl ReplayBuffer {
    /// Create an empty buffer holding at most `capacity` transitions
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity.min(MIN_CAPACITY)),
            pos: 0,
            capacity,
        }
    }

    /// Capacity derived from maze area: `clamp(area * 1000, 50_000, 150_000)`
    pub fn capacity_for_area(area: usize) -> usize {
        area.saturating_mul(1000).clamp(MIN_CAPACITY, MAX_CAPACITY)
    }

    /// Insert a transition, overwriting the oldest one when full
    pub fn push(&mut self, transition: Transition) {
        if self.entries.len() < self.capacity {
            self.entries.push(transition);
        } else {
            self.entries[self.pos] = transition;
        }
        self.pos = (self.pos + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored transitions from oldest to newest
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.entries.len() < self.capacity {
            0
        } else {
            self.pos
        };
        self.entries[split..].iter().chain(self.entries[..split].iter())
    }

    /// Draw `batch_size` transitions uniformly with replacement
    ///
    /// Returns `None` when the buffer is empty.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Option<TransitionBatch> {
        if self.entries.is_empty() {
            return None;
        }

        let mut observations = Vec::with_capacity(batch_size * OBS_DIM);
        let mut next_observations = Vec::with_capacity(batch_size * OBS_DIM);
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Vec::with_capacity(batch_size);
        let mut dones = Vec::with_capacity(batch_size);

        for _ in 0..batch_size {
            let entry = &self.entries[rng.gen_range(0..self.entries.len())];
            observations.extend_from_slice(entry.observation.as_slice());
            next_observations.extend_from_slice(entry.next_observation.as_slice());
            actions.push(entry.action);
            rewards.push(entry.reward);
            dones.push(if entry.done { 1.0 } else { 0.0 });
        }

        Some(TransitionBatch {
            observations: TensorData::new(observations, [batch_size, OBS_DIM]),
            next_observations: TensorData::new(next_observations, [batch_size, OBS_DIM]),
            actions,
            rewards,
            dones,
        })
    }

    /// Drop every stored transition
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transition tagged through its reward so eviction order is observable
    fn tagged(tag: usize) -> Transition {
        Transition {
            observation: Observation::default(),
            action: tag % 4,
            reward: tag as f32,
            next_observation: Observation::default(),
            done: tag % 2 == 0,
        }
    }

    fn tags(buffer: &ReplayBuffer) -> Vec<usize> {
        buffer.iter_oldest_first().map(|t| t.reward as usize).collect()
    }

    #[test]
    fn test_capacity_for_area() {
        assert_eq!(ReplayBuffer::capacity_for_area(9), 50_000);
        assert_eq!(ReplayBuffer::capacity_for_area(100), 100_000);
        assert_eq!(ReplayBuffer::capacity_for_area(400), 150_000);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = ReplayBuffer::new(5);
        for tag in 0..23 {
            buffer.push(tagged(tag));
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_fifo_eviction_order() {
        let mut buffer = ReplayBuffer::new(4);
        for tag in 0..4 {
            buffer.push(tagged(tag));
        }
        assert_eq!(tags(&buffer), vec![0, 1, 2, 3]);

        buffer.push(tagged(4));
        assert_eq!(tags(&buffer), vec![1, 2, 3, 4]);

        buffer.push(tagged(5));
        buffer.push(tagged(6));
        assert_eq!(tags(&buffer), vec![3, 4, 5, 6]);

        for tag in 7..11 {
            buffer.push(tagged(tag));
        }
        assert_eq!(tags(&buffer), vec![7, 8, 9, 10]);
    }

    #[test]
    fn test_sample_shapes() {
        let mut buffer = ReplayBuffer::new(10);
        for tag in 0..3 {
            buffer.push(tagged(tag));
        }

        let mut rng = rand::thread_rng();
        let batch = buffer.sample(8, &mut rng).unwrap();

        assert_eq!(batch.observations.shape, vec![8, OBS_DIM]);
        assert_eq!(batch.next_observations.shape, vec![8, OBS_DIM]);
        assert_eq!(batch.actions.len(), 8);
        assert!(batch.rewards.iter().all(|r| (0.0..3.0).contains(r)));
        assert!(batch.dones.iter().all(|d| *d == 0.0 || *d == 1.0));
    }

    #[test]
    fn test_sample_empty_buffer() {
        let buffer = ReplayBuffer::new(10);
        assert!(buffer.sample(4, &mut rand::thread_rng()).is_none());
    }

    #[test]
    fn test_stored_observation_is_a_copy() {
        let mut buffer = ReplayBuffer::new(2);
        let mut obs = Observation::default();
        obs.0[0] = 1.0;
        buffer.push(Transition {
            observation: obs,
            action: 0,
            reward: 0.0,
            next_observation: obs,
            done: false,
        });
        obs.0[0] = 0.5;

        let stored = buffer.iter_oldest_first().next().unwrap();
        assert_eq!(stored.observation.0[0], 1.0);
        assert_ne!(stored.observation, obs);
    }

    #[test]
    fn test_clear() {
        let mut buffer = ReplayBuffer::new(3);
        buffer.push(tagged(1));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
