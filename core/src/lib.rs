use core::time::Duration;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use ghost::*;
pub use pursuit::*;
pub use session::*;
pub use tile::*;
pub use timer::*;
pub use types::*;

mod board;
mod engine;
mod error;
mod generator;
mod ghost;
mod pursuit;
mod session;
mod tile;
mod timer;
mod types;

/// Every tunable of a game, from board generation to round timing.
///
/// Deserializing fills missing fields from [`GameConfig::default`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board_size: Coord,
    /// Redundant openings between already connected rooms survive with `1 - 1/n` odds.
    pub board_connectivity: u32,
    pub min_candy: u8,
    pub max_candy: u8,
    pub door_count: DoorNumber,
    pub ghosts: GhostCounts,
    pub setup_tile_attempts: u32,
    pub setup_board_attempts: u32,
    /// Cap on cells a single ghost search may expand.
    pub move_ghost_attempts: u32,
    pub candy_value_min: u32,
    pub candy_value_max: u32,
    /// Collected candy that wins the game.
    pub candy_limit: u32,
    pub moves_per_round: u8,
    /// Rounds without a capture before the ghosts frenzy.
    pub frenzy_interval: u32,
    pub round_time_secs: u64,
    pub start_delay_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 13,
            board_connectivity: 3,
            min_candy: 3,
            max_candy: 6,
            door_count: 5,
            ghosts: GhostCounts::default(),
            setup_tile_attempts: 100,
            setup_board_attempts: 500,
            move_ghost_attempts: 1000,
            candy_value_min: 5,
            candy_value_max: 15,
            candy_limit: 40,
            moves_per_round: 3,
            frenzy_interval: 10,
            round_time_secs: 60,
            start_delay_secs: 5,
        }
    }
}

impl GameConfig {
    /// Parses a possibly partial JSON document and validates the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| {
            log::warn!("Ignoring game config: {err}");
            GameError::InvalidConfig("malformed JSON")
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let check = |ok: bool, reason: &'static str| {
            if ok {
                Ok(())
            } else {
                log::warn!("Rejecting game config: {reason}");
                Err(GameError::InvalidConfig(reason))
            }
        };

        check(self.board_size >= 3, "board size must be at least 3")?;
        check(self.board_connectivity >= 1, "connectivity must be at least 1")?;
        check(self.min_candy <= self.max_candy, "min candy exceeds max candy")?;
        check(
            self.candy_value_min <= self.candy_value_max,
            "candy value range is inverted",
        )?;
        check(self.door_count <= 9, "at most 9 doors are supported")?;
        check(
            self.setup_tile_attempts >= 1
                && self.setup_board_attempts >= 1
                && self.move_ghost_attempts >= 1,
            "attempt budgets must be at least 1",
        )?;
        check(self.moves_per_round >= 1, "players need at least one move")?;
        check(self.frenzy_interval >= 1, "frenzy interval must be at least 1")
    }

    pub const fn round_time(&self) -> Duration {
        Duration::from_secs(self.round_time_secs)
    }

    pub const fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay_secs)
    }
}
