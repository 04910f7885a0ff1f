use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use reversi_core::Player;
use reversi_ui::{Config, DEFAULT_LEVEL, SUPPORTED_LEVELS};

/// Play Reversi against the machine in your terminal.
#[derive(Parser, Debug)]
#[command(name = "reversi", version, about)]
struct Cli {
    /// Search depth of the machine
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_LEVEL,
        value_parser = clap::value_parser!(u32)
            .range(i64::from(*SUPPORTED_LEVELS.start())..=i64::from(*SUPPORTED_LEVELS.end()))
    )]
    level: u32,

    /// Who places the first tile
    #[arg(short, long, value_enum, default_value_t = First::Human)]
    first: First,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum First {
    Human,
    Machine,
}

impl From<First> for Player {
    fn from(first: First) -> Self {
        match first {
            First::Human => Player::Human,
            First::Machine => Player::Machine,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    info!("Command line: {cli:?}");

    reversi_ui::run(Config {
        first_player: cli.first.into(),
        level: cli.level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["reversi"]).unwrap();
        assert_eq!(cli.level, DEFAULT_LEVEL);
        assert_eq!(cli.first, First::Human);
    }

    #[test]
    fn level_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["reversi", "--level", "0"]).is_err());
        assert!(Cli::try_parse_from(["reversi", "--level", "8"]).is_err());
        let cli = Cli::try_parse_from(["reversi", "-l", "7", "--first", "machine"]).unwrap();
        assert_eq!(cli.level, 7);
        assert_eq!(Player::from(cli.first), Player::Machine);
    }
}
