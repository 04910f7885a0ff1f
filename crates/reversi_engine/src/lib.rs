pub mod evaluation;
pub mod search;
pub mod ai;
pub mod history;

pub use evaluation::{evaluate_position, Evaluator, ScoreBreakdown, Weights};
pub use search::{best_move, build_tree, CancelToken, Node};
pub use ai::ReversiAI;
pub use history::{GameHistory, ObserverId};
