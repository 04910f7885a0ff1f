use log::debug;
use reversi_core::{Board, Player, Position, ReversiError, Result};
use crate::evaluation::Evaluator;
use crate::search::{best_move, CancelToken};

/// The computer opponent. Searches as deep as the board's level.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReversiAI {
    evaluator: Evaluator,
}

impl ReversiAI {
    pub fn new(evaluator: Evaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn best_move(&self, board: &Board, cancel: &CancelToken) -> Result<Position> {
        match board.next() {
            None => Err(ReversiError::IllegalMove("the game is already over".into())),
            Some(Player::Human) => {
                Err(ReversiError::IllegalMove("it is not the machine's turn".into()))
            }
            Some(Player::Machine) => best_move(board, &self.evaluator, cancel),
        }
    }

    /// Searches for the machine's move and plays it.
    pub fn machine_move(&self, board: &Board, cancel: &CancelToken) -> Result<Board> {
        let position = self.best_move(board, cancel)?;
        debug!("Machine plays {position} at level {}", board.level());

        board.place(position, Player::Machine).ok_or_else(|| {
            ReversiError::IllegalState(format!("search chose illegal move {position}"))
        })
    }
}
