use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;
use log::{debug, trace};
use reversi_core::{Board, Player, Position, ReversiError, Result};
use crate::evaluation::Evaluator;

/// Cooperative stop flag for a running search. Clones share the flag, so the
/// caller keeps one clone and hands the other to the worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token nobody else holds, for callers that never cancel.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// One position in the game tree. `position` is the move that led here and
/// is `None` only at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Option<Position>,
    pub score: f64,
    pub children: Vec<Node>,
}

impl Node {
    fn leaf(position: Option<Position>, score: f64) -> Self {
        Self { position, score, children: Vec::new() }
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    /// Height of the subtree; a leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.children.iter().map(|c| c.depth() + 1).max().unwrap_or(0)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, prefix: &str, last: bool) -> fmt::Result {
        let branch = if last { "└── " } else { "├── " };
        match self.position {
            Some(pos) => writeln!(f, "{prefix}{branch}{pos}: {}", self.score)?,
            None => writeln!(f, "{prefix}{branch}root: {}", self.score)?,
        }

        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        let count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            child.render(f, &child_prefix, i + 1 == count)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, "", true)
    }
}

/// First node with the lowest score; ties keep the leftmost.
pub fn first_min(nodes: &[Node]) -> Option<&Node> {
    let (first, rest) = nodes.split_first()?;
    Some(rest.iter().fold(first, |min, n| if n.score < min.score { n } else { min }))
}

/// First node with the highest score; ties keep the leftmost.
pub fn first_max(nodes: &[Node]) -> Option<&Node> {
    let (first, rest) = nodes.split_first()?;
    Some(rest.iter().fold(first, |max, n| if n.score > max.score { n } else { max }))
}

/// Builds the full-width game tree below `board`, `depth` plies deep.
///
/// A leaf scores its own board. An inner node scores its own board plus the
/// extremal child: the minimum when the human is to move, the maximum when
/// the machine is. No branches are pruned.
pub fn build_tree(
    board: &Board,
    evaluator: &Evaluator,
    depth: u32,
    cancel: &CancelToken,
) -> Result<Node> {
    expand(board, None, evaluator, depth, cancel)
}

fn expand(
    board: &Board,
    position: Option<Position>,
    evaluator: &Evaluator,
    depth: u32,
    cancel: &CancelToken,
) -> Result<Node> {
    if cancel.is_cancelled() {
        return Err(ReversiError::Cancelled);
    }

    let mover = match board.next() {
        Some(player) if depth > 0 => player,
        _ => return Ok(Node::leaf(position, evaluator.score(board))),
    };

    let children = board
        .valid_moves(mover)
        .iter()
        .map(|mv| expand(&board.apply(mv), Some(mv.position()), evaluator, depth - 1, cancel))
        .collect::<Result<Vec<Node>>>()?;

    let extremal = match mover {
        Player::Human => first_min(&children),
        Player::Machine => first_max(&children),
    }
    .ok_or_else(|| {
        ReversiError::IllegalState(format!("no moves for {mover} on a running game"))
    })?;

    let score = evaluator.score(board) + extremal.score;
    Ok(Node { position, score, children })
}

/// Picks the root child with the highest score, leftmost on ties, searching
/// as deep as the board's level.
pub fn best_move(board: &Board, evaluator: &Evaluator, cancel: &CancelToken) -> Result<Position> {
    let start = Instant::now();
    debug!("Starting search at depth {}", board.level());

    let tree = build_tree(board, evaluator, board.level(), cancel)?;
    trace!("Game tree:\n{tree}");

    let best = first_max(&tree.children)
        .ok_or_else(|| ReversiError::IllegalState("the root has no moves to choose from".into()))?;
    let position = best
        .position
        .ok_or_else(|| ReversiError::IllegalState("child node without a move".into()))?;

    debug!(
        "Search completed in {:?}: {} nodes, best move {} with score {}",
        start.elapsed(),
        tree.size(),
        position,
        best.score
    );
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(row: i32, col: i32, score: f64) -> Node {
        Node::leaf(Some(Position::new(row, col).unwrap()), score)
    }

    #[test]
    fn extremes_prefer_the_leftmost_tie() {
        let nodes = vec![node(0, 0, 1.0), node(0, 1, 3.0), node(0, 2, 3.0), node(0, 3, 1.0)];
        assert_eq!(first_max(&nodes).unwrap().position, Position::new(0, 1).ok());
        assert_eq!(first_min(&nodes).unwrap().position, Position::new(0, 0).ok());
        assert!(first_max(&[]).is_none());
        assert!(first_min(&[]).is_none());
    }

    #[test]
    fn depth_zero_is_a_single_leaf() {
        let board = Board::new(Player::Machine, 1).unwrap();
        let evaluator = Evaluator::default();
        let tree = build_tree(&board, &evaluator, 0, &CancelToken::never()).unwrap();
        assert_eq!(tree.position, None);
        assert!(tree.children.is_empty());
        assert_eq!(tree.score, evaluator.score(&board));
    }

    #[test]
    fn children_follow_row_major_order() {
        let board = Board::new(Player::Machine, 1).unwrap();
        let tree = build_tree(&board, &Evaluator::default(), 1, &CancelToken::never()).unwrap();
        let moves: Vec<Position> = tree.children.iter().filter_map(|c| c.position).collect();
        assert_eq!(moves.len(), 4);
        assert!(moves.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn inner_score_adds_own_score_to_extremal_child() {
        let board = Board::new(Player::Machine, 1).unwrap();
        let evaluator = Evaluator::default();
        let tree = build_tree(&board, &evaluator, 2, &CancelToken::never()).unwrap();

        let own = evaluator.score(&board);
        assert_eq!(tree.score, own + first_max(&tree.children).unwrap().score);
        for child in &tree.children {
            // the human replies at the second ply
            assert!(!child.children.is_empty());
            let grandchild_min = first_min(&child.children).unwrap().score;
            let child_board = board.place(child.position.unwrap(), Player::Machine).unwrap();
            assert_eq!(child.score, evaluator.score(&child_board) + grandchild_min);
        }
    }

    #[test]
    fn terminal_board_is_a_leaf_at_any_depth() {
        let board = Board::from_rows(
            Player::Human,
            Some(Player::Human),
            5,
            [
                "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX",
                "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXX.",
            ],
        )
        .unwrap();
        assert!(board.game_over());
        let tree = build_tree(&board, &Evaluator::default(), 5, &CancelToken::never()).unwrap();
        assert!(tree.children.is_empty());
    }

    #[test]
    fn cancelled_search_unwinds() {
        let board = Board::new(Player::Machine, 3).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            best_move(&board, &Evaluator::default(), &cancel),
            Err(ReversiError::Cancelled)
        );
        cancel.reset();
        assert!(best_move(&board, &Evaluator::default(), &cancel).is_ok());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
    }

    #[test]
    fn display_draws_the_tree() {
        let board = Board::new(Player::Machine, 1).unwrap();
        let tree = build_tree(&board, &Evaluator::default(), 1, &CancelToken::never()).unwrap();
        let text = tree.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("└── root: "));
        assert!(lines[1].starts_with("    ├── "));
        assert!(lines[4].starts_with("    └── "));
    }
}
