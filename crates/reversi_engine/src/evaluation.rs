use reversi_core::{Board, Player, AREA, SIZE};

// Positional significance of every cell. Corners can never be flipped back,
// the cells touching a corner hand it to the opponent.
pub const SIGNIFICANCE: [[i32; SIZE]; SIZE] = [
    [9999,   5, 500, 200, 200, 500,   5, 9999],
    [   5,   1,  50, 150, 150,  50,   1,    5],
    [ 500,  50, 250, 100, 100, 250,  50,  500],
    [ 200, 150, 100,  50,  50, 100, 150,  200],
    [ 200, 150, 100,  50,  50, 100, 150,  200],
    [ 500,  50, 250, 100, 100, 250,  50,  500],
    [   5,   1,  50, 150, 150,  50,   1,    5],
    [9999,   5, 500, 200, 200, 500,   5, 9999],
];

/// Coefficients of the three heuristic terms. The defaults are the tuned
/// values the engine's move choices depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub human_significance: f64,
    pub machine_mobility: f64,
    pub human_mobility: f64,
    pub machine_potential: f64,
    pub human_potential: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            human_significance: 1.5,
            machine_mobility: 3.0,
            human_mobility: 4.0,
            machine_potential: 2.5,
            human_potential: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub significance: f64,
    pub mobility: f64,
    pub potential: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.significance + self.mobility + self.potential
    }
}

/// Scores boards from the machine's point of view; higher is better for
/// the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Evaluator {
    weights: Weights,
}

impl Evaluator {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn score(&self, board: &Board) -> f64 {
        self.breakdown(board).total()
    }

    pub fn breakdown(&self, board: &Board) -> ScoreBreakdown {
        ScoreBreakdown {
            significance: self.significance(board),
            mobility: self.mobility(board),
            potential: self.potential(board),
        }
    }

    /// Weighted cells held by each side. Human cells count extra so that the
    /// machine does not settle for passive positions.
    fn significance(&self, board: &Board) -> f64 {
        let mut human = 0;
        let mut machine = 0;
        for (pos, slot) in board.slots() {
            match slot {
                Some(Player::Human) => human += SIGNIFICANCE[pos.row()][pos.col()],
                Some(Player::Machine) => machine += SIGNIFICANCE[pos.row()][pos.col()],
                None => {}
            }
        }
        machine as f64 - self.weights.human_significance * human as f64
    }

    /// Legal move counts, grown in weight as the board fills up.
    fn mobility(&self, board: &Board) -> f64 {
        let human = board.mobility(Player::Human);
        let machine = board.mobility(Player::Machine);
        let occupied = board.occupied_count();
        AREA as f64 / occupied as f64
            * (self.weights.machine_mobility * machine as f64
                - self.weights.human_mobility * human as f64)
    }

    /// Empty cells next to a tile are future moves for that tile's opponent.
    fn potential(&self, board: &Board) -> f64 {
        let mut human = 0;
        let mut machine = 0;
        for (pos, slot) in board.slots() {
            match slot {
                Some(Player::Human) => machine += board.free_neighbors(pos),
                Some(Player::Machine) => human += board.free_neighbors(pos),
                None => {}
            }
        }
        let occupied = board.occupied_count();
        AREA as f64 / (2.0 * occupied as f64)
            * (self.weights.machine_potential * machine as f64
                - self.weights.human_potential * human as f64)
    }
}

/// Scores a board with the default weights.
pub fn evaluate_position(board: &Board) -> f64 {
    Evaluator::default().score(board)
}
