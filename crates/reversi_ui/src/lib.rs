use std::{
    fmt::Write as _,
    io::{self, BufRead},
    ops::RangeInclusive,
    str::FromStr,
    sync::{mpsc, Arc, Mutex, MutexGuard},
    thread,
};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use reversi_core::{Player, Position, ReversiError, SIZE};
use reversi_engine::{CancelToken, GameHistory};

pub const SUPPORTED_LEVELS: RangeInclusive<u32> = 1..=7;
pub const DEFAULT_LEVEL: u32 = 3;

const HELP: &str = "\
Commands:
  c4        place a tile (column a-h, row 1-8)
  undo      take back your last move
  new       restart with the same first player
  switch    restart with the other player moving first
  level N   set the machine's search depth (1-7)
  help      show this text
  quit      leave the game";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub first_player: Player,
    pub level: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_player: Player::Human,
            level: DEFAULT_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Place(Position),
    Undo,
    New,
    Switch,
    Level(u32),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let input = input.trim().to_ascii_lowercase();
        let mut words = input.split_whitespace();
        let command = match (words.next(), words.next()) {
            (Some("undo" | "u"), None) => Command::Undo,
            (Some("new" | "n"), None) => Command::New,
            (Some("switch" | "s"), None) => Command::Switch,
            (Some("help" | "h" | "?"), None) => Command::Help,
            (Some("quit" | "q" | "exit"), None) => Command::Quit,
            (Some("level" | "l"), Some(level)) => {
                let level = level
                    .parse::<u32>()
                    .map_err(|_| format!("`{level}` is not a level"))?;
                if !SUPPORTED_LEVELS.contains(&level) {
                    return Err(format!(
                        "level must be between {} and {}",
                        SUPPORTED_LEVELS.start(),
                        SUPPORTED_LEVELS.end()
                    ));
                }
                Command::Level(level)
            }
            (Some(cell), None) => Position::from_algebraic(cell)
                .map(Command::Place)
                .ok_or_else(|| format!("unknown command `{cell}`, type `help`"))?,
            _ => return Err(format!("unknown command `{input}`, type `help`")),
        };
        if words.next().is_some() {
            return Err(format!("unexpected trailing input in `{input}`"));
        }
        Ok(command)
    }
}

enum Event {
    Input(String),
    InputClosed,
    Changed,
    Notice(&'static str),
    MachineDone {
        generation: u64,
        result: std::result::Result<(), ReversiError>,
    },
}

enum Flow {
    Continue,
    Quit,
}

struct GameState {
    history: Arc<Mutex<GameHistory>>,
    events: mpsc::Sender<Event>,
    ai_task: Option<(u64, CancelToken)>,
    generation: u64,
}

/// Runs an interactive game on stdin/stdout until the player quits or
/// input ends.
pub fn run(config: Config) -> Result<()> {
    let (events, inbox) = mpsc::channel();

    let mut history = GameHistory::new(config.first_player, config.level)
        .context("failed to set up the game")?;
    let changed = events.clone();
    history.subscribe(move || {
        let _ = changed.send(Event::Changed);
    });

    spawn_input_reader(events.clone());

    let mut state = GameState::new(history, events);

    info!("Starting game: {:?}", config);
    println!("{HELP}\n");
    state.update_ui_text()?;
    state.update_ai()?;

    loop {
        let event = inbox.recv().context("event channel closed")?;
        let flow = match event {
            Event::Input(line) => state.handle_input(&line)?,
            Event::InputClosed => Flow::Quit,
            Event::Changed => {
                state.update_ui_text()?;
                Flow::Continue
            }
            Event::Notice(text) => {
                println!("{text}");
                Flow::Continue
            }
            Event::MachineDone { generation, result } => {
                state.finish_ai_task(generation, result);
                Flow::Continue
            }
        };
        if let Flow::Quit = flow {
            state.cancel_ai_task();
            break;
        }
    }
    Ok(())
}

fn spawn_input_reader(events: mpsc::Sender<Event>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if events.send(Event::Input(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    warn!("Failed to read input: {err}");
                    break;
                }
            }
        }
        let _ = events.send(Event::InputClosed);
    });
}

impl GameState {
    fn new(history: GameHistory, events: mpsc::Sender<Event>) -> Self {
        Self {
            history: Arc::new(Mutex::new(history)),
            events,
            ai_task: None,
            generation: 0,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, GameHistory>> {
        self.history
            .lock()
            .map_err(|_| anyhow!("game state lock poisoned"))
    }

    fn thinking(&self) -> bool {
        self.ai_task.is_some()
    }

    fn handle_input(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                warn!("Rejected input {line:?}: {message}");
                println!("{message}");
                return Ok(Flow::Continue);
            }
        };
        debug!("Command: {command:?}");

        match command {
            Command::Place(pos) => self.place(pos)?,
            Command::Undo => {
                self.cancel_ai_task();
                let mut history = self.lock()?;
                if history.undo_possible() {
                    history.undo()?;
                } else {
                    println!("Nothing to undo.");
                }
            }
            Command::New => self.restart(false)?,
            Command::Switch => self.restart(true)?,
            Command::Level(level) => {
                if self.thinking() {
                    println!("Wait for the machine to finish before changing the level.");
                } else {
                    self.lock()?.set_level(level)?;
                    println!("Level set to {level}.");
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn place(&mut self, pos: Position) -> Result<()> {
        if self.thinking() {
            println!("The machine is thinking, please wait.");
            return Ok(());
        }

        {
            let mut history = self.lock()?;
            if history.game_over()? {
                println!("The game is over. Type `new` to play again.");
                return Ok(());
            }
            let accepted = history.move_at(pos.row() as i32, pos.col() as i32)?;
            if !accepted {
                println!("\x07{pos} is not a legal move.");
                return Ok(());
            }
            if history.next()? == Some(Player::Human) {
                println!("The machine has to pass.");
            }
        }
        self.update_ai()
    }

    fn restart(&mut self, switch: bool) -> Result<()> {
        self.cancel_ai_task();
        {
            let mut history = self.lock()?;
            let first = history.first_player()?;
            let first = if switch { first.opponent() } else { first };
            let level = history.level()?;
            history.new_game(first, level)?;
        }
        self.update_ai()
    }

    /// Starts machine moves on the thread pool if it is the machine's turn.
    fn update_ai(&mut self) -> Result<()> {
        if self.thinking() || self.lock()?.next()? != Some(Player::Machine) {
            return Ok(());
        }

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancelToken::new();
        self.ai_task = Some((generation, cancel.clone()));

        let history = Arc::clone(&self.history);
        let events = self.events.clone();
        rayon::spawn(move || {
            let result = play_machine_turns(&history, &cancel, &events);
            let _ = events.send(Event::MachineDone { generation, result });
        });
        Ok(())
    }

    fn cancel_ai_task(&mut self) {
        if let Some((generation, cancel)) = self.ai_task.take() {
            debug!("Cancelling machine task #{generation}");
            cancel.cancel();
        }
    }

    fn finish_ai_task(&mut self, generation: u64, result: std::result::Result<(), ReversiError>) {
        match &self.ai_task {
            Some((current, _)) if *current == generation => self.ai_task = None,
            _ => {
                debug!("Ignoring result of superseded machine task #{generation}");
                return;
            }
        }

        match result {
            Ok(()) => {}
            Err(ReversiError::Cancelled) => debug!("Machine task #{generation} cancelled"),
            Err(err) => {
                warn!("Machine move failed: {err}");
                println!("The machine could not move: {err}");
            }
        }
    }

    fn screen(&self) -> Result<String> {
        let history = self.lock()?;
        Ok(render(&history)?)
    }

    fn update_ui_text(&self) -> Result<()> {
        println!("{}", self.screen()?);
        Ok(())
    }
}

fn lock_shared(
    shared: &Mutex<GameHistory>,
) -> std::result::Result<MutexGuard<'_, GameHistory>, ReversiError> {
    shared
        .lock()
        .map_err(|_| ReversiError::IllegalState("game state lock poisoned".into()))
}

/// Lets the machine move until it is the human's turn or the game ends.
///
/// The lock is held only to copy the board and to commit the reply, never
/// during the search itself.
fn play_machine_turns(
    shared: &Mutex<GameHistory>,
    cancel: &CancelToken,
    events: &mpsc::Sender<Event>,
) -> std::result::Result<(), ReversiError> {
    loop {
        let (from, ai) = {
            let history = lock_shared(shared)?;
            if cancel.is_cancelled() {
                return Err(ReversiError::Cancelled);
            }
            if history.next()? != Some(Player::Machine) {
                return Ok(());
            }
            (history.current()?.clone(), history.ai())
        };

        let reply = ai.machine_move(&from, cancel)?;

        let mut history = lock_shared(shared)?;
        if cancel.is_cancelled() {
            return Err(ReversiError::Cancelled);
        }
        history.commit_machine_move(&from, reply)?;
        if history.next()? == Some(Player::Machine) {
            let _ = events.send(Event::Notice("You have to pass."));
        }
    }
}

pub fn verdict(winner: Option<Player>) -> &'static str {
    match winner {
        Some(Player::Human) => "You have won!",
        Some(Player::Machine) => "The machine has won.",
        None => "Tie game!",
    }
}

/// Draws the current board with coordinates, tile counts and whose turn it is.
pub fn render(history: &GameHistory) -> std::result::Result<String, ReversiError> {
    let board = history.current()?;
    let mut out = String::new();

    out.push_str("   ");
    for col in 0..SIZE {
        out.push(' ');
        out.push((b'a' + col as u8) as char);
    }
    out.push('\n');

    for (pos, slot) in board.slots() {
        if pos.col() == 0 {
            let _ = write!(out, "  {}", pos.row() + 1);
        }
        out.push(' ');
        out.push(slot.map_or('.', Player::symbol));
        if pos.col() == SIZE - 1 {
            out.push('\n');
        }
    }

    let _ = writeln!(
        out,
        "You ({}): {}   Machine ({}): {}   Level: {}",
        Player::Human,
        board.tile_count(Player::Human),
        Player::Machine,
        board.tile_count(Player::Machine),
        board.level()
    );

    let status = match board.next() {
        Some(Player::Human) if history.undo_possible() => "Your move (undo available).",
        Some(Player::Human) => "Your move.",
        Some(Player::Machine) => "The machine is thinking...",
        None => verdict(board.winner()?),
    };
    out.push_str(status);
    Ok(out)
}
