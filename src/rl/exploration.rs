//! Linear ε-greedy exploration schedule

use serde::{Deserialize, Serialize};

/// ε used when training resumes on an already trained agent
pub const DEFAULT_RESUME_EPSILON: f32 = 0.4;

/// Linearly interpolates ε from `start` to `end` over `decay_episodes`
///
/// # Example
///
/// ```rust
/// use ml_maze::rl::EpsilonSchedule;
///
/// let mut schedule = EpsilonSchedule::new(1.0, 0.0, 4);
/// schedule.decay();
/// assert!((schedule.epsilon() - 0.75).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    start: f32,
    end: f32,
    decay_episodes: usize,
    episode_count: usize,
    epsilon: f32,
}

impl EpsilonSchedule {
    pub fn new(start: f32, end: f32, decay_episodes: usize) -> Self {
        Self {
            start,
            end,
            decay_episodes,
            episode_count: 0,
            epsilon: start,
        }
    }

    /// Count one completed episode and move ε along the line, clamped at `end`
    pub fn decay(&mut self) {
        self.episode_count += 1;
        let fraction = if self.decay_episodes == 0 {
            1.0
        } else {
            (self.episode_count as f32 / self.decay_episodes as f32).min(1.0)
        };
        self.epsilon = self.start + fraction * (self.end - self.start);
    }

    /// Restart the schedule from `value`, keeping the end point and length
    pub fn reset_to(&mut self, value: f32) {
        self.start = value;
        self.epsilon = value;
        self.episode_count = 0;
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Episodes counted since construction or the last reset
    pub fn episode_count(&self) -> usize {
        self.episode_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_start_value() {
        let schedule = EpsilonSchedule::new(1.0, 0.05, 200);
        assert_eq!(schedule.epsilon(), 1.0);
        assert_eq!(schedule.episode_count(), 0);
    }

    #[test]
    fn test_linear_decay() {
        let mut schedule = EpsilonSchedule::new(1.0, 0.1, 10);
        for _ in 0..5 {
            schedule.decay();
        }
        assert!((schedule.epsilon() - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_clamped_at_end() {
        let mut schedule = EpsilonSchedule::new(1.0, 0.05, 3);
        for _ in 0..10 {
            schedule.decay();
        }
        assert!((schedule.epsilon() - 0.05).abs() < 1e-6);
        assert_eq!(schedule.episode_count(), 10);
    }

    #[test]
    fn test_reset_restarts_from_value() {
        let mut schedule = EpsilonSchedule::new(1.0, 0.0, 10);
        for _ in 0..20 {
            schedule.decay();
        }
        schedule.reset_to(DEFAULT_RESUME_EPSILON);
        assert!((schedule.epsilon() - 0.4).abs() < 1e-6);

        schedule.decay();
        assert!((schedule.epsilon() - 0.36).abs() < 1e-6);
    }

    #[test]
    fn test_zero_length_schedule_jumps_to_end() {
        let mut schedule = EpsilonSchedule::new(1.0, 0.2, 0);
        schedule.decay();
        assert!((schedule.epsilon() - 0.2).abs() < 1e-6);
    }
}
