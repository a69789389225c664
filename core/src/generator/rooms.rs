use core::ops::RangeBounds;
use std::collections::VecDeque;

use ndarray::Array2;
use rand::Rng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;

use super::RejectReason;
use crate::*;

/// Label of a maximal connected group of open cells.
pub type RoomId = u16;

/// Union-find over room labels, with path compression and union by rank.
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<RoomId>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).map(|id| id as RoomId).collect(),
            rank: vec![0; len],
        }
    }

    pub fn find(&mut self, item: RoomId) -> RoomId {
        let mut root = item;
        while self.parent[usize::from(root)] != root {
            root = self.parent[usize::from(root)];
        }

        let mut cursor = item;
        while cursor != root {
            let next = self.parent[usize::from(cursor)];
            self.parent[usize::from(cursor)] = root;
            cursor = next;
        }

        root
    }

    /// Merges the sets of `a` and `b`, returning `false` if they were already merged.
    pub fn union(&mut self, a: RoomId, b: RoomId) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }

        let (rank_a, rank_b) = (self.rank[usize::from(root_a)], self.rank[usize::from(root_b)]);
        if rank_a < rank_b {
            self.parent[usize::from(root_a)] = root_b;
        } else {
            self.parent[usize::from(root_b)] = root_a;
            if rank_a == rank_b {
                self.rank[usize::from(root_a)] += 1;
            }
        }
        true
    }

    pub fn connected(&mut self, a: RoomId, b: RoomId) -> bool {
        self.find(a) == self.find(b)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoomMap {
    labels: Array2<Option<RoomId>>,
    rooms: Vec<Vec<Coord2>>,
}

impl RoomMap {
    /// Flood-fills every non-wall cell into rooms.
    pub fn label(board: &Board) -> Self {
        let size = board.size();
        let mut labels: Array2<Option<RoomId>> = Array2::from_elem((size, size).to_nd_index(), None);
        let mut rooms: Vec<Vec<Coord2>> = Vec::new();

        for (start, cell) in board.iter() {
            if cell.is_wall() || labels[start.to_nd_index()].is_some() {
                continue;
            }

            let id = rooms.len() as RoomId;
            let mut members = Vec::new();
            let mut to_visit = VecDeque::from([start]);
            labels[start.to_nd_index()] = Some(id);

            while let Some(coords) = to_visit.pop_front() {
                members.push(coords);
                for neighbor in board.iter_neighbors(coords) {
                    if board[neighbor].is_wall() || labels[neighbor.to_nd_index()].is_some() {
                        continue;
                    }
                    labels[neighbor.to_nd_index()] = Some(id);
                    to_visit.push_back(neighbor);
                }
            }

            rooms.push(members);
        }

        Self { labels, rooms }
    }

    pub fn room_at(&self, coords: Coord2) -> Option<RoomId> {
        self.labels.get(coords.to_nd_index()).copied().flatten()
    }

    pub fn cells(&self, room: RoomId) -> &[Coord2] {
        &self.rooms[usize::from(room)]
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// A wall cell that, once removed, joins two rooms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Opening {
    pub cell: Coord2,
    pub rooms: (RoomId, RoomId),
}

fn is_wall_or_edge(board: &Board, coords: Option<Coord2>) -> bool {
    coords.is_none_or(|coords| board[coords].is_wall())
}

/// Rooms on either side of `cell` along one axis, when the cross axis is closed.
fn rooms_across(
    board: &Board,
    map: &RoomMap,
    cell: Coord2,
    (near, far): (Direction, Direction),
) -> Option<(RoomId, RoomId)> {
    let size = board.size();
    let a = map.room_at(near.step(cell, size)?)?;
    let b = map.room_at(far.step(cell, size)?)?;
    if a == b {
        return None;
    }

    let (side_a, side_b) = if near.is_vertical() {
        (Direction::Left, Direction::Right)
    } else {
        (Direction::Up, Direction::Down)
    };
    let closed = is_wall_or_edge(board, side_a.step(cell, size))
        && is_wall_or_edge(board, side_b.step(cell, size));

    closed.then_some((a, b))
}

/// Every wall cell separating exactly two rooms on opposite sides.
pub fn candidate_openings(board: &Board, map: &RoomMap) -> Vec<Opening> {
    board
        .iter()
        .filter(|(_, cell)| cell.is_wall())
        .filter_map(|(cell, _)| {
            let vertical = rooms_across(board, map, cell, (Direction::Up, Direction::Down));
            let horizontal = rooms_across(board, map, cell, (Direction::Left, Direction::Right));
            match (vertical, horizontal) {
                (Some(rooms), None) | (None, Some(rooms)) => Some(Opening { cell, rooms }),
                _ => None,
            }
        })
        .collect()
}

/// Rooms of a carved board joined into one connected structure, with BFS distance layers.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomGraph {
    map: RoomMap,
    openings: Vec<Opening>,
    entry_room: RoomId,
    distances: Vec<u16>,
    leaves: Vec<RoomId>,
    /// Room labels ordered by distance layer, ties in label order.
    by_distance: Vec<RoomId>,
}

impl RoomGraph {
    /// Opens walls between rooms until every room is connected to the entry room.
    ///
    /// Redundant openings are kept with probability `1 - 1/connectivity`, openings touching
    /// the entry room are always kept.
    pub fn connect<R: Rng + ?Sized>(
        board: &mut Board,
        rng: &mut R,
        connectivity: u32,
    ) -> core::result::Result<Self, RejectReason> {
        let map = RoomMap::label(board);
        let entry_room = map.room_at(board.entry()).ok_or(RejectReason::EntryBlocked)?;

        let mut candidates = candidate_openings(board, &map);
        candidates.shuffle(rng);

        let mut sets = DisjointSet::new(map.len());
        let mut openings = Vec::new();
        for opening in candidates {
            let (a, b) = opening.rooms;
            let accept = a == entry_room
                || b == entry_room
                || !sets.connected(a, b)
                || rng.random_ratio(connectivity.saturating_sub(1), connectivity.max(1));
            if accept {
                sets.union(a, b);
                board[opening.cell] = Cell::Blank;
                log::trace!("Opened {:?} between rooms {} and {}", opening.cell, a, b);
                openings.push(opening);
            }
        }

        let entry_root = sets.find(entry_room);
        let rooms = map.len() as RoomId;
        if (0..rooms).any(|room| sets.find(room) != entry_root) {
            return Err(RejectReason::Disconnected);
        }

        let (distances, leaves) = Self::layer(&map, &openings, entry_room)?;
        let mut by_distance: Vec<RoomId> = (0..rooms).collect();
        by_distance.sort_by_key(|&room| distances[usize::from(room)]);
        Ok(Self {
            map,
            openings,
            entry_room,
            distances,
            leaves,
            by_distance,
        })
    }

    /// Breadth-first distance of each room from the entry room, and the rooms the search
    /// reached without discovering anything new from them.
    fn layer(
        map: &RoomMap,
        openings: &[Opening],
        entry_room: RoomId,
    ) -> core::result::Result<(Vec<u16>, Vec<RoomId>), RejectReason> {
        let mut adjacent: Vec<SmallVec<[RoomId; 4]>> = vec![SmallVec::new(); map.len()];
        for opening in openings {
            let (a, b) = opening.rooms;
            adjacent[usize::from(a)].push(b);
            adjacent[usize::from(b)].push(a);
        }

        let mut distances: Vec<Option<u16>> = vec![None; map.len()];
        let mut leaves = Vec::new();
        let mut to_visit = VecDeque::from([entry_room]);
        distances[usize::from(entry_room)] = Some(0);

        while let Some(room) = to_visit.pop_front() {
            let distance = distances[usize::from(room)].unwrap_or_default();
            let mut discovered = false;
            for &next in &adjacent[usize::from(room)] {
                if distances[usize::from(next)].is_none() {
                    distances[usize::from(next)] = Some(distance + 1);
                    to_visit.push_back(next);
                    discovered = true;
                }
            }
            if !discovered && room != entry_room {
                leaves.push(room);
            }
        }

        distances
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .map(|distances| (distances, leaves))
            .ok_or(RejectReason::Disconnected)
    }

    pub fn map(&self) -> &RoomMap {
        &self.map
    }

    pub fn openings(&self) -> &[Opening] {
        &self.openings
    }

    pub fn entry_room(&self) -> RoomId {
        self.entry_room
    }

    pub fn room_count(&self) -> usize {
        self.map.len()
    }

    pub fn distance(&self, room: RoomId) -> u16 {
        self.distances[usize::from(room)]
    }

    pub fn leaves(&self) -> &[RoomId] {
        &self.leaves
    }

    /// Rooms no further than `depth` layers from the entry, nearest first.
    pub fn rooms_up_to(&self, depth: u16) -> &[RoomId] {
        let end = self
            .by_distance
            .partition_point(|&room| self.distance(room) <= depth);
        &self.by_distance[..end]
    }

    /// Rooms whose distance layer falls inside `range`, in label order.
    pub fn rooms_within(&self, range: impl RangeBounds<u16>) -> Vec<RoomId> {
        (0..self.map.len() as RoomId)
            .filter(|&room| range.contains(&self.distance(room)))
            .collect()
    }
}
