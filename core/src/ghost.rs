use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostKind {
    Haunter,
    Gengar,
    Mimikyu,
    Dusclops,
}

impl GhostKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Haunter => "Haunter",
            Self::Gengar => "Gengar",
            Self::Mimikyu => "Mimikyu",
            Self::Dusclops => "Dusclops",
        }
    }

    /// Moves per round before frenzy and haunt bonuses.
    pub const fn base_moves(self) -> u8 {
        match self {
            Self::Haunter | Self::Dusclops => 1,
            Self::Gengar | Self::Mimikyu => 2,
        }
    }

    pub const fn glyph(self) -> char {
        match self {
            Self::Haunter => 'H',
            Self::Gengar => 'G',
            Self::Mimikyu => 'M',
            Self::Dusclops => 'D',
        }
    }

    /// Dusclops always catches players standing next to it, diagonals included.
    pub const fn haunts_next_turn(self) -> bool {
        matches!(self, Self::Dusclops)
    }

    pub const fn is_mimikyu(self) -> bool {
        matches!(self, Self::Mimikyu)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ghost {
    pub kind: GhostKind,
    pub position: Coord2,
    pub moves_per_turn: u8,
    pub haunt_next_turn: bool,
}

impl Ghost {
    pub fn new(kind: GhostKind, position: Coord2) -> Self {
        Self {
            kind,
            position,
            moves_per_turn: kind.base_moves(),
            haunt_next_turn: kind.haunts_next_turn(),
        }
    }

    /// Whether this ghost catches a player standing on `player`.
    ///
    /// `extended` widens the reach to every cell within Chebyshev distance 1.
    pub fn catches(&self, player: Coord2, extended: bool) -> bool {
        if extended {
            chebyshev(self.position, player) <= 1
        } else {
            self.position == player
        }
    }
}

/// Orders ghosts the way the ghost phase moves them: by name, descending.
pub fn sort_ghosts(ghosts: &mut [Ghost]) {
    ghosts.sort_by(|a, b| b.kind.name().cmp(a.kind.name()));
}

/// How many ghosts of each kind a generated board receives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostCounts {
    pub haunter: u8,
    pub gengar: u8,
    pub mimikyu: u8,
    pub dusclops: u8,
}

impl GhostCounts {
    pub const fn total(&self) -> usize {
        self.haunter as usize + self.gengar as usize + self.mimikyu as usize + self.dusclops as usize
    }
}

impl Default for GhostCounts {
    fn default() -> Self {
        Self {
            haunter: 4,
            gengar: 2,
            mimikyu: 1,
            dusclops: 1,
        }
    }
}
