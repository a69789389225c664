use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::*;
pub use carve::*;
pub use placer::*;
pub use random::*;
pub use rooms::*;

mod carve;
mod placer;
mod random;
mod rooms;

/// Everything a game needs from setup: the puzzle board and the ghosts on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub board: Board,
    pub ghosts: Vec<Ghost>,
    pub seed: u64,
    /// Board attempts used, the accepted one included.
    pub attempts: u32,
}

pub trait LayoutGenerator {
    fn generate(&mut self, config: &GameConfig) -> Result<Layout>;
}

/// Why a single board attempt was thrown away. Never leaves the retry loop.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("entry tile is not open")]
    EntryBlocked,
    #[error("some rooms cannot be reached from the entry")]
    Disconnected,
    #[error("only {found} rooms, at least {needed} needed")]
    TooFewRooms { found: usize, needed: usize },
    #[error("only {placed} candy placed, at least {needed} needed")]
    NotEnoughCandy { placed: u8, needed: u8 },
    #[error("no spawn room left for {0:?}")]
    GhostSpawn(GhostKind),
    #[error("no ghost can reach the entry")]
    NoPursuit,
}
