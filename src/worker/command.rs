use serde::{Deserialize, Serialize};

use crate::maze::MazeConfig;
use crate::rl::HyperParams;

/// Request sent to the [`Worker`](super::Worker)
///
/// Serialized with a `type` tag, e.g. `{"type": "start_test", "rows": 8, "cols": 8, "count": 5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Train on the given mazes; `fresh` discards any existing agent first
    StartTrain {
        mazes: Vec<MazeConfig>,
        #[serde(default)]
        hyper_params: HyperParams,
        #[serde(default)]
        fresh: bool,
    },

    /// Evaluate on `count` seeded test mazes of the given size
    StartTest { rows: usize, cols: usize, count: usize },

    /// Run the greedy agent once on a user maze
    Play { maze: MazeConfig },

    /// Cancel the active run
    Stop,

    /// Cancel the active run and discard the agent
    Reset,

    SaveModel {
        slot: usize,
        #[serde(default)]
        name: String,
    },
    LoadModel { slot: usize },
    DeleteModel { slot: usize },
    CopyModel { from: usize, to: usize },
    ListModels,
}

impl Command {
    /// Wire name of the command, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartTrain { .. } => "start_train",
            Command::StartTest { .. } => "start_test",
            Command::Play { .. } => "play",
            Command::Stop => "stop",
            Command::Reset => "reset",
            Command::SaveModel { .. } => "save_model",
            Command::LoadModel { .. } => "load_model",
            Command::DeleteModel { .. } => "delete_model",
            Command::CopyModel { .. } => "copy_model",
            Command::ListModels => "list_models",
        }
    }

    /// Whether the command starts a long-running job
    pub fn is_run(&self) -> bool {
        matches!(
            self,
            Command::StartTrain { .. } | Command::StartTest { .. } | Command::Play { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_train_with_defaults() {
        let json = r#"{"type":"start_train","mazes":[{"num_rows":3,"num_cols":3,"walls":[[1,1]],"start":[0,0]}]}"#;
        let command: Command = serde_json::from_str(json).unwrap();

        let Command::StartTrain {
            mazes,
            hyper_params,
            fresh,
        } = command
        else {
            panic!("expected start_train");
        };
        assert_eq!(mazes.len(), 1);
        assert_eq!(mazes[0].goal, crate::maze::Cell::new(2, 2));
        assert_eq!(hyper_params, HyperParams::default());
        assert!(!fresh);
    }

    #[test]
    fn test_parse_unit_commands() {
        let stop: Command = serde_json::from_str(r#"{"type":"stop"}"#).unwrap();
        let list: Command = serde_json::from_str(r#"{"type":"list_models"}"#).unwrap();

        assert_eq!(stop, Command::Stop);
        assert_eq!(list, Command::ListModels);
    }

    #[test]
    fn test_name_matches_tag() {
        let command = Command::CopyModel { from: 1, to: 2 };
        let json = serde_json::to_value(&command).unwrap();

        assert_eq!(json["type"], command.name());
        assert!(!command.is_run());
        assert!(Command::Play { maze: MazeConfig::new(3, 3) }.is_run());
    }
}
