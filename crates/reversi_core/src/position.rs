use std::fmt;
use crate::error::{ReversiError, Result};

pub const SIZE: usize = 8;
pub const AREA: usize = SIZE * SIZE;

/// A cell on the board. The fields stay private so that every `Position`
/// in circulation is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    row: usize, // 0-7, top to bottom
    col: usize, // 0-7, left to right
}

impl Position {
    /// Validated constructor for coordinates coming from outside the crate.
    pub fn new(row: i32, col: i32) -> Result<Self> {
        if row < 0 || col < 0 {
            return Err(ReversiError::InvalidArgument(format!(
                "negative board index ({row}, {col})"
            )));
        }
        let (row, col) = (row as usize, col as usize);
        if row >= SIZE || col >= SIZE {
            return Err(ReversiError::InvalidArgument(format!(
                "position ({row}, {col}) is off the board"
            )));
        }
        Ok(Self { row, col })
    }

    pub fn row(self) -> usize {
        self.row
    }

    pub fn col(self) -> usize {
        self.col
    }

    /// Parses `c4` style notation: column letter `a-h`, row digit `1-8`.
    pub fn from_algebraic(notation: &str) -> Option<Self> {
        let mut chars = notation.chars();
        let col = chars.next()?.to_ascii_lowercase();
        let row = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        if !('a'..='h').contains(&col) || !('1'..='8').contains(&row) {
            return None;
        }

        Some(Self {
            row: (row as u8 - b'1') as usize,
            col: (col as u8 - b'a') as usize,
        })
    }

    /// All cells in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..SIZE).flat_map(|row| (0..SIZE).map(move |col| Position { row, col }))
    }

    /// The adjacent cell in `direction`, if it is still on the board.
    pub fn step(self, direction: Direction) -> Option<Position> {
        let (dr, dc) = direction.offset();
        let row = self.row as isize + dr;
        let col = self.col as isize + dc;
        if (0..SIZE as isize).contains(&row) && (0..SIZE as isize).contains(&col) {
            Some(Position { row: row as usize, col: col as usize })
        } else {
            None
        }
    }

    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        Direction::ALL.into_iter().filter_map(move |d| self.step(d))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col as u8) as char, self.row + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// `(row, col)` delta of one step.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
            Direction::East => (0, 1),
            Direction::NorthWest => (-1, -1),
            Direction::NorthEast => (-1, 1),
            Direction::SouthWest => (1, -1),
            Direction::SouthEast => (1, 1),
        }
    }
}
