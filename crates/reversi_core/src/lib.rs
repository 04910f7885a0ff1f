// Core Reversi game logic modules
pub mod board;
pub mod error;
pub mod player;
pub mod position;
pub mod moves;

// Re-export main types for convenience
pub use board::Board;
pub use error::{ReversiError, Result};
pub use player::Player;
pub use position::{Direction, Position, AREA, SIZE};
pub use moves::Move;
