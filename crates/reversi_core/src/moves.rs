use crate::{Board, Player, Position, position::Direction};

/// A legal placement together with every tile it reverses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    position: Position,
    player: Player,
    flips: Vec<Position>,
}

impl Move {
    /// Runs the flanking rule for `player` placing at `position`.
    ///
    /// Walks outward in each direction over opponent tiles; a run that ends on
    /// one of the player's own tiles is flanked. Returns `None` when the target
    /// is occupied or nothing would be flanked, i.e. the move is illegal.
    pub fn flanking(board: &Board, position: Position, player: Player) -> Option<Move> {
        if board.slot(position).is_some() {
            return None;
        }

        let opponent = player.opponent();
        let mut flips = Vec::new();

        for direction in Direction::ALL {
            let mut run = Vec::new();
            let mut cursor = position.step(direction);

            while let Some(pos) = cursor {
                if board.slot(pos) != Some(opponent) {
                    break;
                }
                run.push(pos);
                cursor = pos.step(direction);
            }

            if let Some(end) = cursor {
                if board.slot(end) == Some(player) {
                    flips.extend(run);
                }
            }
        }

        if flips.is_empty() {
            None
        } else {
            Some(Move { position, player, flips })
        }
    }

    /// Legality is defined by `flanking` alone so that checking a move and
    /// applying it can never disagree.
    pub fn is_legal(board: &Board, position: Position, player: Player) -> bool {
        Self::flanking(board, position, player).is_some()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn flips(&self) -> &[Position] {
        &self.flips
    }
}
