use std::fmt;
use log::debug;
use reversi_core::{Board, Player, ReversiError, Result};
use crate::ai::ReversiAI;
use crate::search::CancelToken;

/// Handle returned by `GameHistory::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut() + Send>;

/// The boards of one game, oldest first, with undo back to the human's last
/// turn. The stack always holds at least the opening board.
///
/// Not internally synchronised: callers on several threads must wrap it in a
/// lock and issue one mutating call at a time.
pub struct GameHistory {
    boards: Vec<Board>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    ai: ReversiAI,
}

impl GameHistory {
    pub fn new(first_player: Player, level: u32) -> Result<Self> {
        Self::with_ai(first_player, level, ReversiAI::default())
    }

    pub fn with_ai(first_player: Player, level: u32, ai: ReversiAI) -> Result<Self> {
        Ok(Self {
            boards: vec![Board::new(first_player, level)?],
            observers: Vec::new(),
            next_observer: 0,
            ai,
        })
    }

    /// Throws the current game away and starts over.
    pub fn new_game(&mut self, first_player: Player, level: u32) -> Result<()> {
        let board = Board::new(first_player, level)?;
        self.boards.clear();
        self.boards.push(board);
        debug!("New game: {first_player} moves first at level {level}");
        self.notify();
        Ok(())
    }

    /// A human move on the current board. `Ok(false)` means the target was
    /// occupied or flanked nothing; the history is unchanged.
    pub fn move_at(&mut self, row: i32, col: i32) -> Result<bool> {
        match self.current()?.move_at(row, col)? {
            Some(board) => {
                self.push(board);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn machine_move(&mut self) -> Result<()> {
        self.machine_move_with(&CancelToken::never())
    }

    /// Plays the machine's move, giving up with `Cancelled` once `cancel` is
    /// set. Nothing is pushed on failure.
    pub fn machine_move_with(&mut self, cancel: &CancelToken) -> Result<()> {
        let board = self.ai.machine_move(self.current()?, cancel)?;
        self.push(board);
        Ok(())
    }

    /// Pushes a machine reply that was searched on a copy of `from` while the
    /// history was free for other callers. `IllegalState` if the game moved on
    /// in the meantime, `IllegalMove` unless `board` is a legal machine move
    /// from `from`.
    pub fn commit_machine_move(&mut self, from: &Board, board: Board) -> Result<()> {
        if self.current()? != from {
            return Err(ReversiError::IllegalState(
                "the game changed while the machine was thinking".into(),
            ));
        }
        if from.next() != Some(Player::Machine) {
            return Err(ReversiError::IllegalMove("it is not the machine's turn".into()));
        }
        let legal = from
            .valid_moves(Player::Machine)
            .iter()
            .any(|mv| from.apply(mv) == board);
        if !legal {
            return Err(ReversiError::IllegalMove(
                "board is not a machine reply to the current position".into(),
            ));
        }
        self.push(board);
        Ok(())
    }

    /// Rewinds to the board before the human's most recent move, skipping any
    /// machine moves made since.
    pub fn undo(&mut self) -> Result<()> {
        if !self.undo_possible() {
            return Err(ReversiError::IllegalState("nothing to undo".into()));
        }

        self.boards.pop();
        while self.current()?.next() != Some(Player::Human) {
            self.boards.pop();
        }
        debug!("Undo: {} boards left", self.boards.len());
        self.notify();
        Ok(())
    }

    /// True if some board below the top was waiting for the human.
    pub fn undo_possible(&self) -> bool {
        let below_top = self.boards.len().saturating_sub(1);
        self.boards[..below_top]
            .iter()
            .any(|board| board.next() == Some(Player::Human))
    }

    /// Changes the search depth for the whole game, including boards an undo
    /// may return to.
    pub fn set_level(&mut self, level: u32) -> Result<()> {
        self.current()?;
        self.boards = self
            .boards
            .iter()
            .map(|board| board.with_level(level))
            .collect::<Result<Vec<Board>>>()?;
        debug!("Level set to {level}");
        Ok(())
    }

    pub fn subscribe<F>(&mut self, handler: F) -> ObserverId
    where
        F: FnMut() + Send + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    pub fn current(&self) -> Result<&Board> {
        self.boards
            .last()
            .ok_or_else(|| ReversiError::IllegalState("board stack is empty".into()))
    }

    pub fn next(&self) -> Result<Option<Player>> {
        Ok(self.current()?.next())
    }

    pub fn game_over(&self) -> Result<bool> {
        Ok(self.current()?.game_over())
    }

    pub fn winner(&self) -> Result<Option<Player>> {
        self.current()?.winner()
    }

    pub fn slot_at(&self, row: i32, col: i32) -> Result<Option<Player>> {
        self.current()?.slot_at(row, col)
    }

    pub fn tile_count(&self, player: Player) -> Result<usize> {
        Ok(self.current()?.tile_count(player))
    }

    pub fn first_player(&self) -> Result<Player> {
        Ok(self.current()?.first_player())
    }

    pub fn level(&self) -> Result<u32> {
        Ok(self.current()?.level())
    }

    pub fn ai(&self) -> ReversiAI {
        self.ai
    }

    /// Number of boards on the stack, never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    fn push(&mut self, board: Board) {
        let next = board.next();
        self.boards.push(board);
        debug!("Pushed board #{}, next to move: {:?}", self.boards.len(), next);
        self.notify();
    }

    fn notify(&mut self) {
        for (_, observer) in self.observers.iter_mut() {
            observer();
        }
    }
}

impl fmt::Debug for GameHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameHistory")
            .field("boards", &self.boards)
            .field("observers", &self.observers.len())
            .field("ai", &self.ai)
            .finish()
    }
}
