use core::iter;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use smallvec::SmallVec;

use super::{RejectReason, RoomGraph, RoomId};
use crate::*;

/// Carves doors, switches, candy and ghost spawns into a connected, layered board.
pub struct PuzzlePlacer<'a> {
    board: &'a mut Board,
    graph: &'a RoomGraph,
    config: &'a GameConfig,
    occupied: Vec<Coord2>,
}

impl<'a> PuzzlePlacer<'a> {
    pub fn new(board: &'a mut Board, graph: &'a RoomGraph, config: &'a GameConfig) -> Self {
        Self {
            board,
            graph,
            config,
            occupied: Vec::new(),
        }
    }

    /// Rooms a board needs, entry room included, before ghost spawns have any chance.
    pub fn minimum_rooms(config: &GameConfig) -> usize {
        let ghosts = config.ghosts;
        let far = (ghosts.dusclops + ghosts.gengar).max(ghosts.mimikyu);
        1 + usize::from(far.max(ghosts.haunter))
    }

    /// A random blank cell of `room` that is neither the entry nor a ghost spawn.
    fn free_cell<R: Rng + ?Sized>(&self, room: RoomId, rng: &mut R) -> Option<Coord2> {
        let entry = self.board.entry();
        let free: SmallVec<[Coord2; 16]> = self
            .graph
            .map()
            .cells(room)
            .iter()
            .copied()
            .filter(|&cell| cell != entry && self.board[cell].is_blank())
            .filter(|cell| !self.occupied.contains(cell))
            .collect();
        free.choose(rng).copied()
    }

    /// Turns openings into numbered doors, each with a switch on the entry side.
    ///
    /// A door only goes on an opening whose rooms are both at least one layer from the entry,
    /// and its switch goes in a room no deeper than the nearer of the two. Returns the number of
    /// pairs placed, which may fall short of the configured count.
    pub fn place_doors<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DoorNumber {
        let openings = self.graph.openings();
        if openings.is_empty() {
            return 0;
        }

        let mut claimed = vec![false; openings.len()];
        let mut placed: DoorNumber = 0;
        for _ in 0..self.config.setup_tile_attempts {
            if placed >= self.config.door_count {
                break;
            }

            let index = rng.random_range(0..openings.len());
            let opening = openings[index];
            if claimed[index] || !self.board[opening.cell].is_blank() {
                continue;
            }

            let (a, b) = opening.rooms;
            let depth = self.graph.distance(a).min(self.graph.distance(b));
            if depth == 0 {
                continue;
            }

            let Some(&room) = self.graph.rooms_up_to(depth).choose(rng) else {
                continue;
            };
            let Some(switch) = self.free_cell(room, rng) else {
                continue;
            };

            placed += 1;
            claimed[index] = true;
            self.board[opening.cell] = Cell::Door {
                number: placed,
                unlocked: false,
            };
            self.board[switch] = Cell::Switch { door: placed };
            log::trace!("Door {placed} at {:?}, switch at {switch:?}", opening.cell);
        }
        placed
    }

    /// Puts one candy in each of as many leaf rooms as allowed, topping up from deeper rooms
    /// when leaves alone do not reach the minimum.
    pub fn place_candy<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> core::result::Result<u8, RejectReason> {
        let mut leaves = self.graph.leaves().to_vec();
        leaves.shuffle(rng);

        let mut stocked: Vec<RoomId> = Vec::new();
        for room in leaves {
            if stocked.len() >= usize::from(self.config.max_candy) {
                break;
            }
            if let Some(cell) = self.free_cell(room, rng) {
                self.board[cell] = Cell::Candy { has_candy: true };
                stocked.push(room);
            }
        }

        if stocked.len() < usize::from(self.config.min_candy) {
            let deep = self.graph.rooms_within(2..);
            for _ in 0..self.config.setup_tile_attempts {
                if stocked.len() >= usize::from(self.config.min_candy) {
                    break;
                }
                let Some(&room) = deep.choose(rng) else {
                    break;
                };
                if stocked.contains(&room) {
                    continue;
                }
                if let Some(cell) = self.free_cell(room, rng) {
                    self.board[cell] = Cell::Candy { has_candy: true };
                    stocked.push(room);
                }
            }
        }

        let placed = stocked.len() as u8;
        if placed < self.config.min_candy {
            return Err(RejectReason::NotEnoughCandy {
                placed,
                needed: self.config.min_candy,
            });
        }
        Ok(placed)
    }

    /// Spawns every configured ghost, sorted in the order the ghost phase moves them.
    ///
    /// Dusclops and Gengar share the rooms two or more layers out, Mimikyu picks from the same
    /// layers on its own, and Haunters take rooms one to three layers out. Within each group no
    /// two ghosts share a room.
    pub fn place_ghosts<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> core::result::Result<Vec<Ghost>, RejectReason> {
        let counts = self.config.ghosts;
        let far = self.graph.rooms_within(2..);
        let near = self.graph.rooms_within(1..=3);

        let mut ghosts = Vec::with_capacity(counts.total());
        let heavy = iter::repeat_n(GhostKind::Dusclops, counts.dusclops.into())
            .chain(iter::repeat_n(GhostKind::Gengar, counts.gengar.into()));
        self.spawn_group(rng, &far, heavy, &mut ghosts)?;
        let mimics = iter::repeat_n(GhostKind::Mimikyu, counts.mimikyu.into());
        self.spawn_group(rng, &far, mimics, &mut ghosts)?;
        let haunters = iter::repeat_n(GhostKind::Haunter, counts.haunter.into());
        self.spawn_group(rng, &near, haunters, &mut ghosts)?;

        sort_ghosts(&mut ghosts);
        Ok(ghosts)
    }

    fn spawn_group<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        rooms: &[RoomId],
        kinds: impl IntoIterator<Item = GhostKind>,
        ghosts: &mut Vec<Ghost>,
    ) -> core::result::Result<(), RejectReason> {
        let mut used: SmallVec<[RoomId; 8]> = SmallVec::new();
        for kind in kinds {
            let mut spawned = false;
            for _ in 0..self.config.setup_tile_attempts {
                let Some(&room) = rooms.choose(rng) else {
                    break;
                };
                if used.contains(&room) {
                    continue;
                }
                let Some(cell) = self.free_cell(room, rng) else {
                    continue;
                };
                used.push(room);
                self.occupied.push(cell);
                ghosts.push(Ghost::new(kind, cell));
                spawned = true;
                break;
            }
            if !spawned {
                return Err(RejectReason::GhostSpawn(kind));
            }
        }
        Ok(())
    }
}
