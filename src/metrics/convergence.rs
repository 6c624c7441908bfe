//! Early-stopping detector for training

use std::collections::VecDeque;

/// Largest step-count standard deviation that still counts as converged
pub const CONVERGENCE_STDEV: f32 = 2.0;

/// Rolling window over the most recent episodes
///
/// Training has converged once the last `window` episodes all reached the
/// goal and their step counts have a population standard deviation below
/// [`CONVERGENCE_STDEV`].
#[derive(Debug, Clone)]
pub struct EarlyStopWindow {
    window: usize,
    recent_goals: VecDeque<bool>,
    recent_lengths: VecDeque<usize>,
}

impl EarlyStopWindow {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recent_goals: VecDeque::with_capacity(window),
            recent_lengths: VecDeque::with_capacity(window),
        }
    }

    /// Record one finished episode and report whether training has converged
    pub fn record(&mut self, reached_goal: bool, steps: usize) -> bool {
        push_bounded(&mut self.recent_goals, reached_goal, self.window);
        if reached_goal {
            push_bounded(&mut self.recent_lengths, steps, self.window);
        }

        self.window > 0
            && self.recent_goals.len() == self.window
            && self.recent_goals.iter().all(|&reached| reached)
            && self.recent_lengths.len() >= self.window
            && population_stdev(self.recent_lengths.iter().copied()) < CONVERGENCE_STDEV
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

fn push_bounded<T>(deque: &mut VecDeque<T>, value: T, window: usize) {
    if deque.len() >= window {
        deque.pop_front();
    }
    deque.push_back(value);
}

/// Population standard deviation; zero for fewer than two values
pub fn population_stdev(values: impl IntoIterator<Item = usize>) -> f32 {
    let values: Vec<f32> = values.into_iter().map(|v| v as f32).collect();
    if values.len() < 2 {
        return 0.0;
    }

    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32;
    variance.sqrt()
}
