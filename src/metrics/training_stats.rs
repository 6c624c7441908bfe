//! Training statistics tracking for DQN
//!
//! This module provides utilities for tracking and monitoring training progress,
//! including episode lengths, goal rate and loss values.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// Tracks episode-level metrics (steps, goal reached) and update-level metrics
/// (Bellman loss) using rolling windows for smoothed statistics.
///
/// # Example
///
/// ```rust
/// use ml_maze::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// // Record an episode
/// stats.record_episode(14, true);
///
/// // Record a learning step
/// stats.record_loss(0.02);
///
/// println!("Success rate: {}", stats.success_rate());
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Whether each episode reached the goal (rolling window)
    episode_goals: VecDeque<bool>,

    /// Losses returned by `learn()` (rolling window)
    losses: VecDeque<f32>,

    /// Total number of episodes completed
    total_episodes: usize,

    /// Total number of environment steps taken
    total_steps: usize,

    /// Total number of episodes that reached the goal
    total_goals: usize,

    /// Window size for rolling averages
    window_size: usize,
}

impl TrainingStats {
    /// Create a new training statistics tracker
    ///
    /// # Arguments
    ///
    /// * `window_size` - Number of recent values to keep for rolling averages
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_goals: VecDeque::with_capacity(window_size),
            losses: VecDeque::with_capacity(window_size),
            total_episodes: 0,
            total_steps: 0,
            total_goals: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    ///
    /// # Example
    ///
    /// ```rust
    /// use ml_maze::metrics::TrainingStats;
    ///
    /// let mut stats = TrainingStats::new(100);
    /// stats.record_episode(36, false);
    ///
    /// assert_eq!(stats.total_episodes(), 1);
    /// assert_eq!(stats.total_steps(), 36);
    /// ```
    pub fn record_episode(&mut self, length: usize, reached_goal: bool) {
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.episode_goals, reached_goal, self.window_size);
        self.total_episodes += 1;
        self.total_steps += length;
        if reached_goal {
            self.total_goals += 1;
        }
    }

    /// Record the loss of one learning step
    pub fn record_loss(&mut self, loss: f32) {
        Self::push_deque(&mut self.losses, loss, self.window_size);
    }

    /// Get the mean episode length over the rolling window
    pub fn mean_episode_length(&self) -> f32 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f32 / self.episode_lengths.len() as f32
        }
    }

    /// Fraction of windowed episodes that reached the goal
    pub fn success_rate(&self) -> f32 {
        if self.episode_goals.is_empty() {
            0.0
        } else {
            let goals = self.episode_goals.iter().filter(|&&reached| reached).count();
            goals as f32 / self.episode_goals.len() as f32
        }
    }

    /// Get the mean loss over the rolling window
    ///
    /// # Returns
    ///
    /// The average loss, or 0.0 if no learning step has run
    pub fn mean_loss(&self) -> f32 {
        if self.losses.is_empty() {
            0.0
        } else {
            self.losses.iter().sum::<f32>() / self.losses.len() as f32
        }
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn total_goals(&self) -> usize {
        self.total_goals
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Format a summary of the current statistics
    ///
    /// ```text
    /// Episodes: 1 | Steps: 14 | Goals: 1 | Success: 100.0% | Len: 14.0 | Loss: 0.0200
    /// ```
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Goals: {} | Success: {:.1}% | Len: {:.1} | Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.total_goals,
            self.success_rate() * 100.0,
            self.mean_episode_length(),
            self.mean_loss(),
        )
    }

    /// Helper function to push to a deque with size limit
    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let stats = TrainingStats::new(100);
        assert_eq!(stats.window_size(), 100);
        assert_eq!(stats.total_episodes(), 0);
        assert_eq!(stats.total_steps(), 0);
    }

    #[test]
    fn test_record_episode() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(50, true);

        assert_eq!(stats.total_episodes(), 1);
        assert_eq!(stats.total_goals(), 1);
        assert!((stats.mean_episode_length() - 50.0).abs() < 1e-5);
        assert!((stats.success_rate() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rolling_window() {
        let mut stats = TrainingStats::new(3);
        stats.record_episode(10, false);
        stats.record_episode(20, true);
        stats.record_episode(30, true);

        assert!((stats.mean_episode_length() - 20.0).abs() < 1e-5);

        // A 4th episode evicts the first
        stats.record_episode(40, true);

        assert_eq!(stats.total_episodes(), 4);
        assert_eq!(stats.total_steps(), 100);
        assert!((stats.mean_episode_length() - 30.0).abs() < 1e-5);
        assert!((stats.success_rate() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rolling_loss() {
        let mut stats = TrainingStats::new(2);
        stats.record_loss(0.1);
        stats.record_loss(0.2);
        assert!((stats.mean_loss() - 0.15).abs() < 1e-5);

        stats.record_loss(0.3);
        assert!((stats.mean_loss() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(14, true);
        stats.record_loss(0.02);

        let summary = stats.format_summary();
        assert!(summary.contains("Episodes: 1"));
        assert!(summary.contains("Steps: 14"));
        assert!(summary.contains("Success: 100.0%"));
        assert!(summary.contains("Loss: 0.0200"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrainingStats::new(100);

        assert_eq!(stats.mean_episode_length(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.mean_loss(), 0.0);
    }
}
