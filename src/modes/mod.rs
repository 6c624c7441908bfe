//! Long-running jobs driven by the worker: training and evaluation

pub mod evaluate;
pub mod train;

use std::time::Duration;

pub use evaluate::{EvalConfig, EvaluationReport, Evaluator, TestResult};
pub use train::{EpisodeResult, Phase, PhaseMarker, TrainConfig, Trainer, TrainingSession};

/// Result of a job that may be stopped part-way
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> RunOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            RunOutcome::Completed(value) => Some(value),
            RunOutcome::Cancelled => None,
        }
    }
}

/// Pacing pause between visualized steps
///
/// A zero delay still yields so pending commands get a chance to run.
pub(crate) async fn pace(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}
