//! Evaluation of a trained agent
//!
//! The agent plays greedily (ε = 0) on seeded test mazes or on a single user
//! maze. Each rollout reports the maze, every step with its action values and
//! the final path; the batch ends with a [`Score`].

use burn::tensor::backend::AutodiffBackend;
use std::time::Duration;
use tracing::info;

use super::{RunOutcome, pace};
use crate::error::EngineError;
use crate::maze::{Cell, Direction, MazeConfig, bfs_shortest_path, test_maze, validate_maze};
use crate::metrics::{RunSummary, Score};
use crate::rl::{DEFAULT_REVISIT_PENALTY, DqnAgent, MazeEnvironment, RolloutTracker, STUCK_LIMIT};
use crate::worker::{CancelToken, EngineEvent, EventSink, TestSummary};

/// Smallest grid side accepted for generated test mazes
pub const MIN_TEST_SIDE: usize = 2;

/// Largest grid side accepted for generated test mazes
pub const MAX_TEST_SIDE: usize = 50;

/// Outcome of one greedy rollout
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub test_index: usize,
    pub maze: MazeConfig,
    /// Visited cells including the start
    pub path: Vec<Cell>,
    /// `path.len() - 1`
    pub steps: usize,
    pub reached_goal: bool,
    pub bfs_shortest: Option<usize>,
}

impl TestResult {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            reached_goal: self.reached_goal,
            steps: self.steps,
            bfs_shortest: self.bfs_shortest,
        }
    }
}

/// Results of a completed evaluation batch
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub results: Vec<TestResult>,
    pub score: Score,
}

impl EvaluationReport {
    fn new(results: Vec<TestResult>) -> Self {
        let score = Score::from_results(results.iter().map(TestResult::summary));
        Self { results, score }
    }
}

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Pause after every reported step
    ///
    /// Default: 30 ms
    pub step_delay: Duration,
}

impl EvalConfig {
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(30),
        }
    }
}

/// Runs greedy rollouts and scores them
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Evaluate on `count` deterministic test mazes of size `rows x cols`
    ///
    /// Test maze `i` is `test_maze(rows, cols, i)`, so the same request always
    /// evaluates on the same mazes.
    pub async fn run_tests<B: AutodiffBackend>(
        &self,
        agent: &DqnAgent<B>,
        rows: usize,
        cols: usize,
        count: usize,
        events: &EventSink,
        cancel: &CancelToken,
    ) -> Result<RunOutcome<EvaluationReport>, EngineError> {
        if rows < MIN_TEST_SIDE || cols < MIN_TEST_SIDE {
            return Err(EngineError::InvalidMaze(format!(
                "test mazes need at least {MIN_TEST_SIDE} rows and {MIN_TEST_SIDE} columns"
            )));
        }
        if rows > MAX_TEST_SIDE || cols > MAX_TEST_SIDE {
            return Err(EngineError::InvalidMaze(format!(
                "test mazes are limited to {MAX_TEST_SIDE} rows and {MAX_TEST_SIDE} columns, got {rows}x{cols}"
            )));
        }
        info!(rows, cols, count, "evaluation started");

        let mut results = Vec::with_capacity(count);
        for test_index in 0..count {
            let maze = test_maze(rows, cols, test_index);
            match self.rollout(agent, test_index, maze, events, cancel).await {
                Some(result) => results.push(result),
                None => return Ok(RunOutcome::Cancelled),
            }
        }

        Ok(RunOutcome::Completed(self.finish(results, events)))
    }

    /// Run the greedy agent once on a user maze
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidMaze`] when the maze fails validation.
    pub async fn run_playground<B: AutodiffBackend>(
        &self,
        agent: &DqnAgent<B>,
        maze: &MazeConfig,
        events: &EventSink,
        cancel: &CancelToken,
    ) -> Result<RunOutcome<EvaluationReport>, EngineError> {
        validate_maze(maze).into_result()?;

        match self.rollout(agent, 0, maze.clone(), events, cancel).await {
            Some(result) => Ok(RunOutcome::Completed(self.finish(vec![result], events))),
            None => Ok(RunOutcome::Cancelled),
        }
    }

    fn finish(&self, results: Vec<TestResult>, events: &EventSink) -> EvaluationReport {
        let report = EvaluationReport::new(results);
        events.send(EngineEvent::TestDone {
            results: report.results.iter().map(TestSummary::from).collect(),
            score: report.score,
        });
        info!(
            tests = report.results.len(),
            success_rate = report.score.success_rate,
            avg_efficiency = report.score.avg_efficiency,
            total_score = report.score.total_score,
            "evaluation finished"
        );
        report
    }

    /// Greedy rollout on one maze; `None` when cancelled part-way
    ///
    /// Stops on the goal, after `rows * cols * 4` steps, or once any cell has
    /// been visited ten times.
    async fn rollout<B: AutodiffBackend>(
        &self,
        agent: &DqnAgent<B>,
        test_index: usize,
        maze: MazeConfig,
        events: &EventSink,
        cancel: &CancelToken,
    ) -> Option<TestResult> {
        let bfs_shortest =
            bfs_shortest_path(maze.rows, maze.cols, &maze.walls, maze.start, maze.goal)
                .map(|shortest| shortest.length);
        events.send(EngineEvent::TestMaze {
            test_index,
            walls: maze.walls.iter().copied().collect(),
            start: maze.start,
            goal: maze.goal,
            bfs_shortest,
        });

        let step_cap = maze.step_cap();
        let mut env = MazeEnvironment::new(maze.clone(), DEFAULT_REVISIT_PENALTY);
        let mut observation = env.reset();
        let mut tracker = RolloutTracker::new(env.position(), step_cap, Some(STUCK_LIMIT));

        while !tracker.status().is_finished() {
            if cancel.is_cancelled() {
                return None;
            }

            let (action, q_values) = agent.greedy_action_with_q(&observation);
            let result = env.step(action);
            observation = result.observation;
            tracker.record(env.position(), result.terminated);

            events.send(EngineEvent::TestStep {
                test_index,
                step: tracker.steps(),
                position: env.position(),
                action,
                action_name: Direction::from_index(action).arrow().to_string(),
                q_values: EngineEvent::q_value_map(&q_values),
            });
            pace(self.config.step_delay).await;
        }

        let reached_goal = tracker.status().reached_goal();
        let steps = tracker.steps();
        let path = tracker.into_path();

        let result = TestResult {
            test_index,
            maze,
            path,
            steps,
            reached_goal,
            bfs_shortest,
        };
        events.send(EngineEvent::TestResult(TestSummary::from(&result)));
        Some(result)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}
