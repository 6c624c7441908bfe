pub mod convergence;
pub mod score;
pub mod training_stats;

pub use convergence::{CONVERGENCE_STDEV, EarlyStopWindow, population_stdev};
pub use score::{RunSummary, Score, round_to};
pub use training_stats::TrainingStats;
