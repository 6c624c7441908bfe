//! Aggregate score over a batch of evaluation runs

use serde::{Deserialize, Serialize};

/// Outcome of one greedy evaluation run as seen by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reached_goal: bool,
    pub steps: usize,
    pub bfs_shortest: Option<usize>,
}

/// Success rate, route efficiency and the combined 0..=200 score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Fraction of runs that reached the goal, rounded to 2 decimals
    pub success_rate: f32,

    /// Mean of `min(bfs_shortest / steps, 1)` over successful runs, rounded to 2 decimals
    pub avg_efficiency: f32,

    /// `round(success_rate * 100 * (1 + avg_efficiency))` from the unrounded parts
    pub total_score: u32,
}

impl Score {
    /// Score a batch of runs
    ///
    /// Only successful runs with a known, positive shortest route and at least
    /// one step contribute to the efficiency average. An empty batch scores
    /// zero across the board.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ml_maze::metrics::{RunSummary, Score};
    ///
    /// let run = RunSummary { reached_goal: true, steps: 8, bfs_shortest: Some(8) };
    /// let score = Score::from_results([run, run]);
    ///
    /// assert_eq!(score.total_score, 200);
    /// ```
    pub fn from_results(results: impl IntoIterator<Item = RunSummary>) -> Self {
        let mut total = 0usize;
        let mut successes = 0usize;
        let mut efficiencies = Vec::new();

        for run in results {
            total += 1;
            if !run.reached_goal {
                continue;
            }
            successes += 1;
            if let Some(shortest) = run.bfs_shortest.filter(|&len| len > 0) {
                if run.steps > 0 {
                    efficiencies.push((shortest as f32 / run.steps as f32).min(1.0));
                }
            }
        }

        if total == 0 {
            return Self::default();
        }

        let success_rate = successes as f32 / total as f32;
        let avg_efficiency = if efficiencies.is_empty() {
            0.0
        } else {
            efficiencies.iter().sum::<f32>() / efficiencies.len() as f32
        };

        Self {
            success_rate: round_to(success_rate, 2),
            avg_efficiency: round_to(avg_efficiency, 2),
            total_score: (success_rate * 100.0 * (1.0 + avg_efficiency)).round() as u32,
        }
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(reached_goal: bool, steps: usize, bfs_shortest: Option<usize>) -> RunSummary {
        RunSummary {
            reached_goal,
            steps,
            bfs_shortest,
        }
    }

    #[test]
    fn test_empty_batch_scores_zero() {
        assert_eq!(Score::from_results([]), Score::default());
    }

    #[test]
    fn test_all_optimal_scores_200() {
        let score = Score::from_results((0..5).map(|i| run(true, 6 + i, Some(6 + i))));

        assert_eq!(score.success_rate, 1.0);
        assert_eq!(score.avg_efficiency, 1.0);
        assert_eq!(score.total_score, 200);
    }

    #[test]
    fn test_all_failures_score_zero() {
        let score = Score::from_results([run(false, 40, Some(8)), run(false, 12, Some(5))]);

        assert_eq!(score.success_rate, 0.0);
        assert_eq!(score.avg_efficiency, 0.0);
        assert_eq!(score.total_score, 0);
    }

    #[test]
    fn test_efficiency_only_from_successes() {
        // One success at half efficiency, one failure
        let score = Score::from_results([run(true, 10, Some(5)), run(false, 3, Some(3))]);

        assert_eq!(score.success_rate, 0.5);
        assert_eq!(score.avg_efficiency, 0.5);
        assert_eq!(score.total_score, 75);
    }

    #[test]
    fn test_efficiency_capped_at_one() {
        let score = Score::from_results([run(true, 4, Some(6))]);
        assert_eq!(score.avg_efficiency, 1.0);
    }

    #[test]
    fn test_unknown_or_zero_shortest_skipped() {
        let score = Score::from_results([
            run(true, 4, None),
            run(true, 0, Some(0)),
            run(true, 8, Some(4)),
        ]);

        assert_eq!(score.success_rate, 1.0);
        assert_eq!(score.avg_efficiency, 0.5);
        assert_eq!(score.total_score, 150);
    }

    #[test]
    fn test_total_score_uses_unrounded_parts() {
        // sr = 2/3, eff = 1.0 -> round(66.67 * 2) = 133
        let score = Score::from_results([
            run(true, 5, Some(5)),
            run(true, 7, Some(7)),
            run(false, 9, Some(3)),
        ]);

        assert_eq!(score.success_rate, 0.67);
        assert_eq!(score.total_score, 133);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 3), 0.123);
        assert_eq!(round_to(0.98766, 4), 0.9877);
    }
}
