use serde::{Deserialize, Serialize};

/// Number shared by a door and the switch that opens it.
pub type DoorNumber = u8;

/// Mutable puzzle state of a single board cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Blank,
    Wall,
    Door { number: DoorNumber, unlocked: bool },
    Switch { door: DoorNumber },
    Candy { has_candy: bool },
}

impl Cell {
    pub const fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }

    pub const fn is_blank(self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Whether players and ghosts may stand on this cell.
    pub const fn is_traversable(self) -> bool {
        match self {
            Self::Wall => false,
            Self::Door { unlocked, .. } => unlocked,
            Self::Blank | Self::Switch { .. } | Self::Candy { .. } => true,
        }
    }

    /// Display color as a CSS hex string.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Blank => "#f4f1ea",
            Self::Wall => "#2f2a3a",
            Self::Door { unlocked: false, .. } => "#8b4a2b",
            Self::Door { unlocked: true, .. } => "#d8b48a",
            Self::Switch { .. } => "#e8c547",
            Self::Candy { has_candy: true } => "#f06ba8",
            Self::Candy { has_candy: false } => "#f7d6e6",
        }
    }

    /// Single-character label drawn on top of the cell color.
    pub fn label(self) -> char {
        match self {
            Self::Blank => ' ',
            Self::Wall => '#',
            Self::Door { number, .. } | Self::Switch { door: number } => {
                char::from_digit(number.into(), 36).unwrap_or('?')
            }
            Self::Candy { has_candy: true } => '*',
            Self::Candy { has_candy: false } => ' ',
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Blank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_locked_doors_and_walls_block() {
        assert!(Cell::Blank.is_traversable());
        assert!(Cell::Switch { door: 1 }.is_traversable());
        assert!(Cell::Candy { has_candy: false }.is_traversable());
        assert!(Cell::Door { number: 2, unlocked: true }.is_traversable());
        assert!(!Cell::Door { number: 2, unlocked: false }.is_traversable());
        assert!(!Cell::Wall.is_traversable());
    }

    #[test]
    fn projection_follows_mutable_flags() {
        let locked = Cell::Door { number: 3, unlocked: false };
        let unlocked = Cell::Door { number: 3, unlocked: true };

        assert_eq!(locked.label(), '3');
        assert_eq!(Cell::Switch { door: 3 }.label(), '3');
        assert_ne!(locked.color(), unlocked.color());
        assert_eq!(Cell::Candy { has_candy: true }.label(), '*');
        assert_eq!(Cell::Candy { has_candy: false }.label(), ' ');
    }
}
