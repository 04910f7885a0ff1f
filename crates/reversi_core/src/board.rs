use std::fmt;
use log::trace;
use crate::{
    error::{ReversiError, Result},
    position::SIZE,
    Move, Player, Position,
};

/// Immutable game state. Every operation that changes the game returns a new
/// `Board`; the grid is plain `Copy` data so two boards never share storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    slots: [[Option<Player>; SIZE]; SIZE],
    first_player: Player,
    last_player: Option<Player>,
    level: u32,
}

impl Board {
    /// Sets up the 2x2 centre: the first player holds the lower-left and
    /// upper-right cells, the opponent the other diagonal.
    pub fn new(first_player: Player, level: u32) -> Result<Self> {
        check_level(level)?;

        let mut slots = [[None; SIZE]; SIZE];
        let hi = SIZE / 2;
        let lo = hi - 1;
        slots[lo][lo] = Some(first_player.opponent());
        slots[lo][hi] = Some(first_player);
        slots[hi][lo] = Some(first_player);
        slots[hi][hi] = Some(first_player.opponent());

        Ok(Self {
            slots,
            first_player,
            last_player: None,
            level,
        })
    }

    /// Builds an arbitrary position from eight rows of `X`, `O` and `.`.
    /// Whitespace inside a row is ignored.
    pub fn from_rows(
        first_player: Player,
        last_player: Option<Player>,
        level: u32,
        rows: [&str; SIZE],
    ) -> Result<Self> {
        check_level(level)?;

        let mut slots = [[None; SIZE]; SIZE];
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if cells.len() != SIZE {
                return Err(ReversiError::InvalidArgument(format!(
                    "row {row} has {} cells, expected {SIZE}",
                    cells.len()
                )));
            }
            for (col, &symbol) in cells.iter().enumerate() {
                slots[row][col] = match symbol {
                    '.' => None,
                    other => Some(Player::from_symbol(other).ok_or_else(|| {
                        ReversiError::InvalidArgument(format!(
                            "unknown cell '{other}' at ({row}, {col})"
                        ))
                    })?),
                };
            }
        }

        Ok(Self {
            slots,
            first_player,
            last_player,
            level,
        })
    }

    pub fn first_player(&self) -> Player {
        self.first_player
    }

    pub fn last_player(&self) -> Option<Player> {
        self.last_player
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn slot(&self, pos: Position) -> Option<Player> {
        self.slots[pos.row()][pos.col()]
    }

    pub fn slot_at(&self, row: i32, col: i32) -> Result<Option<Player>> {
        Ok(self.slot(Position::new(row, col)?))
    }

    /// Every cell with its occupant, row-major.
    pub fn slots(&self) -> impl Iterator<Item = (Position, Option<Player>)> + '_ {
        Position::all().map(move |pos| (pos, self.slot(pos)))
    }

    /// Whose turn it is. The opponent of the last mover goes next if they
    /// can; otherwise the last mover moves again (a forced pass). `None`
    /// means neither side can move.
    pub fn next(&self) -> Option<Player> {
        match self.last_player {
            None => Some(self.first_player),
            Some(last) => {
                if self.has_valid_move(last.opponent()) {
                    Some(last.opponent())
                } else if self.has_valid_move(last) {
                    Some(last)
                } else {
                    None
                }
            }
        }
    }

    /// A move by the human player. `Ok(None)` means the target is occupied
    /// or flanks nothing.
    pub fn move_at(&self, row: i32, col: i32) -> Result<Option<Board>> {
        match self.next() {
            None => return Err(ReversiError::IllegalMove("the game is already over".into())),
            Some(Player::Machine) => {
                return Err(ReversiError::IllegalMove("it is not the human's turn".into()))
            }
            Some(Player::Human) => {}
        }
        let pos = Position::new(row, col)?;

        let result = self.place(pos, Player::Human);
        if result.is_none() {
            trace!("rejected human move at {pos}");
        }
        Ok(result)
    }

    /// Places a tile for `player` without consulting whose turn it is.
    pub fn place(&self, pos: Position, player: Player) -> Option<Board> {
        Move::flanking(self, pos, player).map(|mv| self.apply(&mv))
    }

    /// Builds the successor board for a move produced by `Move::flanking` or
    /// `valid_moves` on this board.
    pub fn apply(&self, mv: &Move) -> Board {
        debug_assert_eq!(
            Move::flanking(self, mv.position(), mv.player()).as_ref(),
            Some(mv),
            "move was computed on a different board"
        );

        let mut next = self.clone();
        let player = Some(mv.player());
        let target = mv.position();
        next.slots[target.row()][target.col()] = player;
        for flip in mv.flips() {
            next.slots[flip.row()][flip.col()] = player;
        }
        next.last_player = Some(mv.player());
        next
    }

    /// Legal moves for `player`, in row-major order of their target cell.
    pub fn valid_moves(&self, player: Player) -> Vec<Move> {
        Position::all()
            .filter_map(|pos| Move::flanking(self, pos, player))
            .collect()
    }

    pub fn has_valid_move(&self, player: Player) -> bool {
        Position::all().any(|pos| Move::is_legal(self, pos, player))
    }

    /// Number of legal moves available to `player`.
    pub fn mobility(&self, player: Player) -> usize {
        Position::all()
            .filter(|&pos| Move::is_legal(self, pos, player))
            .count()
    }

    pub fn with_level(&self, level: u32) -> Result<Board> {
        check_level(level)?;
        Ok(Board { level, ..self.clone() })
    }

    pub fn game_over(&self) -> bool {
        self.next().is_none()
    }

    /// The player with strictly more tiles, `None` on a tie.
    pub fn winner(&self) -> Result<Option<Player>> {
        if !self.game_over() {
            return Err(ReversiError::IllegalState("the game is not over yet".into()));
        }

        let human = self.tile_count(Player::Human);
        let machine = self.tile_count(Player::Machine);
        Ok(match human.cmp(&machine) {
            std::cmp::Ordering::Greater => Some(Player::Human),
            std::cmp::Ordering::Less => Some(Player::Machine),
            std::cmp::Ordering::Equal => None,
        })
    }

    pub fn tile_count(&self, player: Player) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|&&slot| slot == Some(player))
            .count()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().flatten().filter(|slot| slot.is_some()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.slots.iter().flatten().filter(|slot| slot.is_none()).count()
    }

    /// Unoccupied cells adjacent to `pos`.
    pub fn free_neighbors(&self, pos: Position) -> usize {
        pos.neighbors().filter(|&n| self.slot(n).is_none()).count()
    }
}

fn check_level(level: u32) -> Result<()> {
    if level < 1 {
        return Err(ReversiError::InvalidArgument("level must be positive".into()));
    }
    Ok(())
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.slots {
            let line: Vec<String> = row
                .iter()
                .map(|slot| slot.map_or('.', Player::symbol).to_string())
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: i32, col: i32) -> Position {
        Position::new(row, col).unwrap()
    }

    const TIE_ROWS: [&str; SIZE] = [
        "XXXXXXXX",
        "XXXXXXXX",
        "XXXXXXXX",
        "XXXXXXXX",
        "OOOOOOOO",
        "OOOOOOOO",
        "OOOOOOOO",
        "OOOOOOOO",
    ];

    #[test]
    fn initial_layout() {
        for first in Player::ALL {
            let board = Board::new(first, 3).unwrap();
            assert_eq!(board.occupied_count(), 4);
            assert_eq!(board.tile_count(first), 2);
            assert_eq!(board.tile_count(first.opponent()), 2);
            assert_eq!(board.slot(pos(3, 4)), Some(first));
            assert_eq!(board.slot(pos(4, 3)), Some(first));
            assert_eq!(board.slot(pos(3, 3)), Some(first.opponent()));
            assert_eq!(board.slot(pos(4, 4)), Some(first.opponent()));
            assert_eq!(board.next(), Some(first));
            assert_eq!(board.last_player(), None);
        }
    }

    #[test]
    fn level_must_be_positive() {
        assert!(matches!(Board::new(Player::Human, 0), Err(ReversiError::InvalidArgument(_))));
        let board = Board::new(Player::Human, 2).unwrap();
        assert!(matches!(board.with_level(0), Err(ReversiError::InvalidArgument(_))));
        let deeper = board.with_level(5).unwrap();
        assert_eq!(deeper.level(), 5);
        assert_eq!(board.level(), 2);
    }

    #[test]
    fn slot_at_validates_coordinates() {
        let board = Board::new(Player::Human, 1).unwrap();
        assert_eq!(board.slot_at(3, 4), Ok(Some(Player::Human)));
        assert_eq!(board.slot_at(0, 0), Ok(None));
        assert!(matches!(board.slot_at(8, 0), Err(ReversiError::InvalidArgument(_))));
        assert!(matches!(board.slot_at(0, -1), Err(ReversiError::InvalidArgument(_))));
    }

    #[test]
    fn off_board_coordinates_never_reach_the_grid() {
        let board = Board::new(Player::Human, 1).unwrap();
        for (row, col) in [(9, 0), (0, 9), (8, 8), (i32::MAX, 0), (-9, 2)] {
            assert!(matches!(board.slot_at(row, col), Err(ReversiError::InvalidArgument(_))));
            assert!(matches!(board.move_at(row, col), Err(ReversiError::InvalidArgument(_))));
            assert!(Position::new(row, col).is_err());
        }

        // every cell a caller can name is placeable without panicking
        let placed = Position::all()
            .filter_map(|pos| board.place(pos, Player::Human))
            .count();
        assert_eq!(placed, 4);
    }

    #[test]
    fn first_human_moves_are_the_four_flanking_cells() {
        let board = Board::new(Player::Human, 1).unwrap();
        let targets: Vec<Position> = board
            .valid_moves(Player::Human)
            .iter()
            .map(Move::position)
            .collect();
        assert_eq!(targets, vec![pos(2, 3), pos(3, 2), pos(4, 5), pos(5, 4)]);
    }

    #[test]
    fn human_move_flips_and_hands_over_the_turn() {
        let board = Board::new(Player::Human, 1).unwrap();
        let after = board.move_at(2, 3).unwrap().unwrap();

        assert_eq!(after.slot(pos(2, 3)), Some(Player::Human));
        assert_eq!(after.slot(pos(3, 3)), Some(Player::Human));
        assert_eq!(after.tile_count(Player::Human), 4);
        assert_eq!(after.tile_count(Player::Machine), 1);
        assert_eq!(after.last_player(), Some(Player::Human));
        assert_eq!(after.next(), Some(Player::Machine));
        // the previous board is untouched
        assert_eq!(board, Board::new(Player::Human, 1).unwrap());
    }

    #[test]
    fn illegal_human_move_returns_none() {
        let board = Board::new(Player::Human, 1).unwrap();
        assert_eq!(board.move_at(0, 0), Ok(None));
        assert_eq!(board.move_at(3, 3), Ok(None));
    }

    #[test]
    fn human_move_preconditions() {
        let machine_first = Board::new(Player::Machine, 1).unwrap();
        assert!(matches!(machine_first.move_at(2, 3), Err(ReversiError::IllegalMove(_))));

        let human_first = Board::new(Player::Human, 1).unwrap();
        assert!(matches!(human_first.move_at(-1, 3), Err(ReversiError::InvalidArgument(_))));
        assert!(matches!(human_first.move_at(2, 8), Err(ReversiError::InvalidArgument(_))));

        let over = Board::from_rows(Player::Human, Some(Player::Machine), 1, TIE_ROWS).unwrap();
        assert!(matches!(over.move_at(0, 0), Err(ReversiError::IllegalMove(_))));
    }

    #[test]
    fn forced_pass_returns_the_turn_to_the_last_mover() {
        // the lone machine tile is stuck in the corner row, the human can
        // still capture it from the east
        let board = Board::from_rows(
            Player::Human,
            Some(Player::Human),
            1,
            [
                "XO......",
                "........",
                "........",
                "........",
                "........",
                "........",
                "........",
                "........",
            ],
        )
        .unwrap();
        assert!(!board.has_valid_move(Player::Machine));
        assert!(board.has_valid_move(Player::Human));
        assert_eq!(board.next(), Some(Player::Human));
        assert!(!board.game_over());
        assert!(matches!(board.winner(), Err(ReversiError::IllegalState(_))));
    }

    #[test]
    fn tie_on_full_board() {
        let board = Board::from_rows(Player::Human, Some(Player::Machine), 1, TIE_ROWS).unwrap();
        assert_eq!(board.tile_count(Player::Human), 32);
        assert_eq!(board.tile_count(Player::Machine), 32);
        assert_eq!(board.next(), None);
        assert!(board.game_over());
        assert_eq!(board.winner(), Ok(None));
    }

    #[test]
    fn winner_has_strictly_more_tiles() {
        let mut rows = TIE_ROWS;
        rows[4] = "XOOOOOOO";
        let board = Board::from_rows(Player::Human, Some(Player::Human), 1, rows).unwrap();
        assert!(board.game_over());
        assert_eq!(board.winner(), Ok(Some(Player::Human)));
    }

    #[test]
    fn free_neighbors_counts_empty_adjacent_cells() {
        let board = Board::new(Player::Human, 1).unwrap();
        assert_eq!(board.free_neighbors(pos(3, 3)), 5);
        assert_eq!(board.free_neighbors(pos(0, 0)), 3);
        assert_eq!(board.empty_count(), 60);
    }

    #[test]
    fn from_rows_rejects_bad_grids() {
        let mut rows = TIE_ROWS;
        rows[2] = "XXXX";
        assert!(matches!(
            Board::from_rows(Player::Human, None, 1, rows),
            Err(ReversiError::InvalidArgument(_))
        ));
        rows[2] = "XXXX?XXX";
        assert!(matches!(
            Board::from_rows(Player::Human, None, 1, rows),
            Err(ReversiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn display_matches_grid() {
        let board = Board::new(Player::Human, 1).unwrap();
        let text = board.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), SIZE);
        assert_eq!(lines[3], ". . . O X . . .");
        assert_eq!(lines[4], ". . . X O . . .");
    }
}
