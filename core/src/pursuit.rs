use std::collections::VecDeque;

use ndarray::Array2;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::*;

/// Result of one breadth-first search from a ghost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchResult {
    /// Path to the nearest player, start cell excluded. Empty when the ghost already stands on one.
    Found(Vec<Coord2>),
    /// Every reachable cell was visited without meeting a player.
    Unreachable,
    /// The expansion cap ran out first.
    Exhausted,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PursuitStep {
    Advanced {
        from: Coord2,
        to: Coord2,
        steps: u8,
        path_len: usize,
    },
    Unreachable,
    Exhausted,
}

impl PursuitStep {
    pub const fn moved(self) -> bool {
        matches!(self, Self::Advanced { steps, .. } if steps > 0)
    }
}

/// Ghost pathfinding over the traversable cells of a board.
pub struct Pursuer<'a> {
    board: &'a Board,
    max_expansions: u32,
}

impl<'a> Pursuer<'a> {
    pub fn new(board: &'a Board, max_expansions: u32) -> Self {
        Self {
            board,
            max_expansions,
        }
    }

    /// Searches outward from `from` for the nearest cell in `players`, trying neighbor
    /// directions in a fresh random order at every node.
    pub fn search<R: Rng + ?Sized>(
        &self,
        from: Coord2,
        players: &[Coord2],
        rng: &mut R,
    ) -> SearchResult {
        self.breadth_first(from, players, |directions| directions.shuffle(rng))
    }

    /// Whether some player can be reached from `from`. A search cut short by the cap counts as
    /// reachable.
    pub fn reaches(&self, from: Coord2, players: &[Coord2]) -> bool {
        !matches!(
            self.breadth_first(from, players, |_| {}),
            SearchResult::Unreachable
        )
    }

    /// Moves `ghost` up to `budget` steps along the path to the nearest player.
    pub fn pursue<R: Rng + ?Sized>(
        &self,
        ghost: &mut Ghost,
        players: &[Coord2],
        budget: u8,
        rng: &mut R,
    ) -> PursuitStep {
        let from = ghost.position;
        match self.search(from, players, rng) {
            SearchResult::Found(path) => {
                let steps = path.len().min(usize::from(budget));
                if let Some(&to) = steps.checked_sub(1).and_then(|last| path.get(last)) {
                    ghost.position = to;
                }
                log::trace!(
                    "{} moved {steps} of {} steps: {from:?} -> {:?}",
                    ghost.kind.name(),
                    path.len(),
                    ghost.position
                );
                PursuitStep::Advanced {
                    from,
                    to: ghost.position,
                    steps: steps as u8,
                    path_len: path.len(),
                }
            }
            SearchResult::Unreachable => PursuitStep::Unreachable,
            SearchResult::Exhausted => {
                log::trace!(
                    "{} at {from:?} gave up after {} expansions",
                    ghost.kind.name(),
                    self.max_expansions
                );
                PursuitStep::Exhausted
            }
        }
    }

    fn breadth_first<F>(&self, from: Coord2, players: &[Coord2], mut order: F) -> SearchResult
    where
        F: FnMut(&mut [Direction; 4]),
    {
        if players.contains(&from) {
            return SearchResult::Found(Vec::new());
        }

        let size = self.board.size();
        let mut came_from: Array2<Option<Coord2>> =
            Array2::from_elem((size, size).to_nd_index(), None);
        came_from[from.to_nd_index()] = Some(from);

        let mut to_visit = VecDeque::from([from]);
        let mut expansions = 0;
        while let Some(coords) = to_visit.pop_front() {
            if expansions >= self.max_expansions {
                return SearchResult::Exhausted;
            }
            expansions += 1;

            let mut directions = Direction::ALL;
            order(&mut directions);
            for direction in directions {
                let Some(next) = direction.step(coords, size) else {
                    continue;
                };
                if came_from[next.to_nd_index()].is_some() || !self.board.is_traversable(next) {
                    continue;
                }
                came_from[next.to_nd_index()] = Some(coords);
                if players.contains(&next) {
                    return SearchResult::Found(Self::unwind(&came_from, from, next));
                }
                to_visit.push_back(next);
            }
        }

        SearchResult::Unreachable
    }

    fn unwind(came_from: &Array2<Option<Coord2>>, from: Coord2, target: Coord2) -> Vec<Coord2> {
        let mut path = vec![target];
        let mut cursor = target;
        while let Some(previous) = came_from[cursor.to_nd_index()] {
            if previous == from {
                break;
            }
            path.push(previous);
            cursor = previous;
        }
        path.reverse();
        path
    }
}
