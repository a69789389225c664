use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Seeded generator that carves, connects and decorates whole boards until one passes.
///
/// Every attempt draws from the same stream, so the seed alone reproduces the whole run,
/// rejected attempts included.
#[derive(Clone, Debug)]
pub struct RandomLayoutGenerator {
    seed: u64,
    rng: SmallRng,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Hands over the random stream, positioned right after the accepted attempt.
    pub fn into_rng(self) -> SmallRng {
        self.rng
    }

    /// Like [`LayoutGenerator::generate`], with an extra acceptance check run on each
    /// otherwise valid layout. A refused layout counts as a failed attempt.
    pub fn generate_with<F>(&mut self, config: &GameConfig, mut accept: F) -> Result<Layout>
    where
        F: FnMut(&Layout, &mut SmallRng) -> bool,
    {
        config.validate()?;
        for attempt in 1..=config.setup_board_attempts {
            let reason = match attempt_layout(config, &mut self.rng) {
                Ok((board, ghosts)) => {
                    let layout = Layout {
                        board,
                        ghosts,
                        seed: self.seed,
                        attempts: attempt,
                    };
                    if accept(&layout, &mut self.rng) {
                        log::debug!("Board attempt {attempt} accepted (seed {})", self.seed);
                        return Ok(layout);
                    }
                    RejectReason::NoPursuit
                }
                Err(reason) => reason,
            };
            log::debug!("Board attempt {attempt} rejected: {reason}");
        }

        log::error!(
            "Board generation gave up after {} attempts, seed {}",
            config.setup_board_attempts,
            self.seed
        );
        Err(GameError::GenerationFailed {
            seed: self.seed,
            attempts: config.setup_board_attempts,
        })
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(&mut self, config: &GameConfig) -> Result<Layout> {
        self.generate_with(config, |_, _| true)
    }
}

fn attempt_layout<R: Rng + ?Sized>(
    config: &GameConfig,
    rng: &mut R,
) -> core::result::Result<(Board, Vec<Ghost>), RejectReason> {
    let size = config.board_size;
    let entry = (rng.random_range(0..size), rng.random_range(0..size));
    let mut board = Board::new(size, entry).map_err(|_| RejectReason::EntryBlocked)?;

    carve_walls(&mut board, rng, config.setup_tile_attempts);
    let graph = RoomGraph::connect(&mut board, rng, config.board_connectivity)?;

    let needed = PuzzlePlacer::minimum_rooms(config);
    if graph.room_count() < needed {
        return Err(RejectReason::TooFewRooms {
            found: graph.room_count(),
            needed,
        });
    }

    let mut placer = PuzzlePlacer::new(&mut board, &graph, config);
    placer.place_doors(rng);
    placer.place_candy(rng)?;
    let ghosts = placer.place_ghosts(rng)?;

    Ok((board, ghosts))
}
