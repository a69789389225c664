use thiserror::Error;

use crate::{DoorNumber, PlayerId};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("Invalid board layout: {0}")]
    InvalidLayout(&'static str),
    #[error("Board generation failed after {attempts} attempts (seed {seed})")]
    GenerationFailed { seed: u64, attempts: u32 },
    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("Player {0} has already been caught")]
    PlayerEliminated(PlayerId),
    #[error("Moves are not being accepted right now")]
    NotAcceptingMoves,
    #[error("Move distance must be at least 1")]
    ZeroDistance,
    #[error("Not enough moves left: requested {requested}, remaining {remaining}")]
    NotEnoughMoves { requested: u8, remaining: u8 },
    #[error("Move blocked: {0}")]
    Blocked(BlockReason),
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Session is closed")]
    SessionClosed,
}

/// Why a single step of a player move could not be taken.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockReason {
    #[error("that would leave the board")]
    OffBoard,
    #[error("there is a wall in the way")]
    Wall,
    #[error("door {0} is still locked")]
    LockedDoor(DoorNumber),
}

pub type Result<T> = core::result::Result<T, GameError>;
