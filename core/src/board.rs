use core::fmt;
use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Square grid of cells plus the tile every player starts on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    entry: Coord2,
}

impl Board {
    /// Blank board of side `size` with the given entry tile.
    pub fn new(size: Coord, entry: Coord2) -> Result<Self> {
        if entry.0 >= size || entry.1 >= size {
            return Err(GameError::InvalidCoords);
        }
        Ok(Self {
            cells: Array2::from_elem((size, size).to_nd_index(), Cell::Blank),
            entry,
        })
    }

    /// Builds a board from text rows.
    ///
    /// `#` wall, `.` blank, `E` entry (blank), `*` candy, `o` eaten candy,
    /// `1`-`9` locked door, `a`-`i` switch for door 1-9.
    pub fn from_ascii(rows: &[&str]) -> Result<Self> {
        let size: Coord = rows
            .len()
            .try_into()
            .map_err(|_| GameError::InvalidLayout("board too large"))?;
        if size == 0 {
            return Err(GameError::InvalidLayout("board is empty"));
        }

        let mut cells = Array2::from_elem((size, size).to_nd_index(), Cell::Blank);
        let mut entry = None;

        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != rows.len() {
                return Err(GameError::InvalidLayout("board must be square"));
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::Blank,
                    '#' => Cell::Wall,
                    '*' => Cell::Candy { has_candy: true },
                    'o' => Cell::Candy { has_candy: false },
                    'E' => {
                        if entry.replace((row, col)).is_some() {
                            return Err(GameError::InvalidLayout("more than one entry"));
                        }
                        Cell::Blank
                    }
                    '1'..='9' => Cell::Door {
                        number: ch as DoorNumber - b'0',
                        unlocked: false,
                    },
                    'a'..='i' => Cell::Switch {
                        door: ch as DoorNumber - b'a' + 1,
                    },
                    _ => return Err(GameError::InvalidLayout("unknown cell character")),
                };
                cells[[row, col]] = cell;
            }
        }

        let (row, col) = entry.ok_or(GameError::InvalidLayout("missing entry"))?;
        Ok(Self {
            cells,
            entry: (row as Coord, col as Coord),
        })
    }

    pub fn size(&self) -> Coord {
        self.cells.nrows().try_into().unwrap_or(Coord::MAX)
    }

    pub fn entry(&self) -> Coord2 {
        self.entry
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size && coords.1 < size {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<Cell> {
        self.cells.get(coords.to_nd_index()).copied()
    }

    pub fn is_traversable(&self, coords: Coord2) -> bool {
        self.get(coords).is_some_and(Cell::is_traversable)
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// All cells in row-major order with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), &cell)| ((row as Coord, col as Coord), cell))
    }

    /// Unlocks the door with `number`, returning whether anything changed.
    pub fn unlock_door(&mut self, number: DoorNumber) -> bool {
        let mut changed = false;
        for cell in self.cells.iter_mut() {
            if let Cell::Door {
                number: door,
                unlocked,
            } = cell
            {
                if *door == number && !*unlocked {
                    *unlocked = true;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Consumes the candy at `coords`, returning whether there was any.
    pub fn take_candy(&mut self, coords: Coord2) -> bool {
        match self.cells.get_mut(coords.to_nd_index()) {
            Some(Cell::Candy { has_candy }) if *has_candy => {
                *has_candy = false;
                true
            }
            _ => false,
        }
    }

    pub fn candy_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, Cell::Candy { .. }))
            .count()
    }

    pub fn door_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, Cell::Door { .. }))
            .count()
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, (row, col): Coord2) -> &Self::Output {
        &self.cells[(row as usize, col as usize)]
    }
}

impl IndexMut<Coord2> for Board {
    fn index_mut(&mut self, (row, col): Coord2) -> &mut Self::Output {
        &mut self.cells[(row as usize, col as usize)]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.rows() {
            for cell in row {
                let ch = match cell {
                    Cell::Blank => '.',
                    Cell::Candy { has_candy: false } => 'o',
                    Cell::Switch { door } => (b'a' + door.saturating_sub(1)) as char,
                    other => other.label(),
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
