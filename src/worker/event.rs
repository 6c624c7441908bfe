use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::maze::{Cell, Direction};
use crate::metrics::{Score, round_to};
use crate::modes::TestResult;
use crate::rl::{NUM_ACTIONS, SlotSummary};

/// Notification emitted by the worker while it runs commands
///
/// Serialized with a `type` tag, one JSON object per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Agent moved during training (every step in the sequential phase,
    /// periodically from slot 0 in the batched phase)
    Step {
        episode: usize,
        maze_index: usize,
        step: usize,
        position: Cell,
        action: usize,
        reward: f32,
    },
    EpisodeEnd {
        episode: usize,
        maze_index: usize,
        total_steps: usize,
        reached_goal: bool,
        epsilon: f32,
        avg_loss: f32,
    },
    TrainingDone {
        total_episodes: usize,
        final_paths: Vec<Vec<Cell>>,
        converged: bool,
    },
    TestMaze {
        test_index: usize,
        walls: Vec<Cell>,
        start: Cell,
        goal: Cell,
        bfs_shortest: Option<usize>,
    },
    TestStep {
        test_index: usize,
        step: usize,
        position: Cell,
        action: usize,
        action_name: String,
        q_values: BTreeMap<String, f32>,
    },
    TestResult(TestSummary),
    TestDone {
        results: Vec<TestSummary>,
        #[serde(flatten)]
        score: Score,
    },
    ModelSaved {
        slot: usize,
        name: String,
    },
    ModelLoaded {
        slot: usize,
        name: String,
        total_episodes: usize,
    },
    ModelDeleted {
        slot: usize,
    },
    ModelCopied {
        from: usize,
        to: usize,
    },
    ModelList {
        slots: Vec<SlotSummary>,
    },
    Error {
        message: String,
    },
}

impl EngineEvent {
    pub fn error(err: &EngineError) -> Self {
        EngineEvent::Error {
            message: err.to_string(),
        }
    }

    /// Q values keyed by action arrow, rounded to 3 decimals
    pub fn q_value_map(q_values: &[f32; NUM_ACTIONS]) -> BTreeMap<String, f32> {
        Direction::ALL
            .iter()
            .map(|direction| {
                (
                    direction.arrow().to_string(),
                    round_to(q_values[direction.index()], 3),
                )
            })
            .collect()
    }
}

/// Per-maze outcome as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub test_index: usize,
    pub reached_goal: bool,
    pub steps: usize,
    pub path: Vec<Cell>,
}

impl From<&TestResult> for TestSummary {
    fn from(result: &TestResult) -> Self {
        Self {
            test_index: result.test_index,
            reached_goal: result.reached_goal,
            steps: result.steps,
            path: result.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_end_wire_format() {
        let event = EngineEvent::EpisodeEnd {
            episode: 3,
            maze_index: 0,
            total_steps: 12,
            reached_goal: true,
            epsilon: 0.5,
            avg_loss: 0.25,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "episode_end");
        assert_eq!(json["total_steps"], 12);
        assert_eq!(json["reached_goal"], true);
    }

    #[test]
    fn test_test_result_is_flat() {
        let event = EngineEvent::TestResult(TestSummary {
            test_index: 1,
            reached_goal: false,
            steps: 2,
            path: vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(0, 0)],
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "test_result");
        assert_eq!(json["path"][1], serde_json::json!([0, 1]));
    }

    #[test]
    fn test_test_done_flattens_score() {
        let event = EngineEvent::TestDone {
            results: Vec::new(),
            score: Score {
                success_rate: 1.0,
                avg_efficiency: 0.5,
                total_score: 150,
            },
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "test_done");
        assert_eq!(json["total_score"], 150);
        assert_eq!(json["avg_efficiency"], 0.5);
    }

    #[test]
    fn test_q_value_map_rounds_and_keys_by_arrow() {
        let map = EngineEvent::q_value_map(&[0.12345, -1.0, 0.5, 2.0006]);

        assert_eq!(map.len(), 4);
        assert_eq!(map["↑"], 0.123);
        assert_eq!(map["→"], -1.0);
        assert_eq!(map["←"], 2.001);
    }

    #[test]
    fn test_error_event_carries_message() {
        let event = EngineEvent::error(&EngineError::NoAgent);
        assert_eq!(
            event,
            EngineEvent::Error {
                message: "no trained agent; run training first".to_string()
            }
        );
    }
}
