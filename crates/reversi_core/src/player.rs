use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Human,
    Machine,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::Human, Player::Machine];

    pub fn opponent(self) -> Player {
        match self {
            Player::Human => Player::Machine,
            Player::Machine => Player::Human,
        }
    }

    /// Single-character tile symbol, also used by `Board::from_rows`.
    pub fn symbol(self) -> char {
        match self {
            Player::Human => 'X',
            Player::Machine => 'O',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Player> {
        match symbol {
            'X' => Some(Player::Human),
            'O' => Some(Player::Machine),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_an_involution() {
        for player in Player::ALL {
            assert_ne!(player.opponent(), player);
            assert_eq!(player.opponent().opponent(), player);
        }
    }

    #[test]
    fn symbols_round_trip() {
        assert_eq!(Player::Human.to_string(), "X");
        assert_eq!(Player::Machine.to_string(), "O");
        assert_eq!(Player::from_symbol('X'), Some(Player::Human));
        assert_eq!(Player::from_symbol('.'), None);
    }
}
