use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Setup,
    RoundLoop,
    GhostPhase,
    Resolution,
    Won,
    Lost,
    Aborted,
}

impl EngineState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Aborted)
    }

    pub const fn accepts_moves(self) -> bool {
        matches!(self, Self::RoundLoop)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Setup
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    CandyLimit,
    GhostsStranded,
    MimikyuTrapped,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Continue,
    Won(WinReason),
    Lost,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostMove {
    pub kind: GhostKind,
    pub from: Coord2,
    pub to: Coord2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandyPickup {
    pub player: PlayerId,
    pub amount: u32,
}

/// What happened between the end of player moves and the next round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub ghost_moves: Vec<GhostMove>,
    pub eliminated: Vec<PlayerId>,
    pub candy: Vec<CandyPickup>,
    pub doors_unlocked: Vec<DoorNumber>,
    pub frenzy: u8,
    pub outcome: RoundOutcome,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub position: Coord2,
    pub moves_left: u8,
    pub eliminated: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub position: Coord2,
    pub moves_left: u8,
}

/// Everything a renderer reads to draw the board.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub tiles: Vec<Vec<TileView>>,
    pub ghosts: Vec<GhostView>,
    pub players: Vec<PlayerView>,
    pub round: u32,
    pub candy_collected: u32,
    pub candy_limit: u32,
    pub frenzy: u8,
    pub state: EngineState,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TileView {
    pub color: &'static str,
    pub label: char,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GhostView {
    pub row: Coord,
    pub column: Coord,
    pub glyph: char,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub row: Coord,
    pub column: Coord,
    pub number: PlayerId,
}

/// Turn loop of a single game: player moves, ghost phase, resolution.
#[derive(Clone, Debug)]
pub struct PlayEngine {
    config: GameConfig,
    board: Board,
    ghosts: Vec<Ghost>,
    players: Vec<PlayerState>,
    state: EngineState,
    round: u32,
    candy_collected: u32,
    rounds_without_capture: u32,
    frenzy: u8,
    mimikyu_trapped: bool,
    mimikyu_haunt: bool,
    seed: u64,
    rng: SmallRng,
}

impl PlayEngine {
    /// Generates a board for `players`, retrying until some ghost can reach the entry.
    ///
    /// Without a `seed` one is taken from the clock. The seed is logged on failure and kept
    /// on the engine otherwise.
    pub fn setup(config: GameConfig, seed: Option<u64>, players: &[PlayerId]) -> Result<Self> {
        let seed = seed.unwrap_or_else(clock_seed);

        let mut generator = RandomLayoutGenerator::new(seed);
        let layout = generator.generate_with(&config, |layout, rng| {
            let pursuer = Pursuer::new(&layout.board, config.move_ghost_attempts);
            let entry = [layout.board.entry()];
            layout.ghosts.iter().any(|ghost| {
                matches!(
                    pursuer.search(ghost.position, &entry, rng),
                    SearchResult::Found(_)
                )
            })
        })?;
        log::info!(
            "Game ready after {} board attempts (seed {seed})",
            layout.attempts
        );

        Self::from_layout(config, layout, players, generator.into_rng())
    }

    /// Builds an engine around an existing layout, every player on the entry tile.
    pub fn from_layout(
        config: GameConfig,
        layout: Layout,
        players: &[PlayerId],
        rng: SmallRng,
    ) -> Result<Self> {
        config.validate()?;
        if players.is_empty() {
            return Err(GameError::InvalidConfig("at least one player is required"));
        }
        for (index, id) in players.iter().enumerate() {
            if players[..index].contains(id) {
                return Err(GameError::InvalidConfig("player ids must be unique"));
            }
        }

        let Layout {
            board,
            mut ghosts,
            seed,
            ..
        } = layout;
        for ghost in &ghosts {
            board.validate_coords(ghost.position)?;
        }
        sort_ghosts(&mut ghosts);

        let entry = board.entry();
        let players = players
            .iter()
            .map(|&id| PlayerState {
                id,
                position: entry,
                moves_left: 0,
                eliminated: false,
            })
            .collect();

        Ok(Self {
            config,
            board,
            ghosts,
            players,
            state: EngineState::Setup,
            round: 0,
            candy_collected: 0,
            rounds_without_capture: 0,
            frenzy: 0,
            mimikyu_trapped: false,
            mimikyu_haunt: false,
            seed,
            rng,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn candy_collected(&self) -> u32 {
        self.candy_collected
    }

    pub fn frenzy(&self) -> u8 {
        self.frenzy
    }

    pub fn rounds_without_capture(&self) -> u32 {
        self.rounds_without_capture
    }

    pub fn mimikyu_trapped(&self) -> bool {
        self.mimikyu_trapped
    }

    pub fn mimikyu_haunt(&self) -> bool {
        self.mimikyu_haunt
    }

    /// Opens the first round. Calling it again once rounds are running is a no-op.
    pub fn start(&mut self) -> Result<u32> {
        self.check_not_finished()?;
        if self.state == EngineState::Setup {
            log::info!(
                "Game started with {} players and {} ghosts (seed {})",
                self.players.len(),
                self.ghosts.len(),
                self.seed
            );
            self.begin_round();
        }
        Ok(self.round)
    }

    /// Moves a player `distance` cells in `direction`.
    ///
    /// The whole move is checked before anything changes: a blocked move leaves the player
    /// and their remaining moves untouched.
    pub fn move_player(
        &mut self,
        id: PlayerId,
        direction: Direction,
        distance: u8,
    ) -> Result<MoveOutcome> {
        self.check_accepting_moves()?;
        if distance == 0 {
            return Err(GameError::ZeroDistance);
        }

        let size = self.board.size();
        let board = &self.board;
        let player = Self::active_player(&mut self.players, id)?;
        if distance > player.moves_left {
            return Err(GameError::NotEnoughMoves {
                requested: distance,
                remaining: player.moves_left,
            });
        }

        let mut position = player.position;
        for _ in 0..distance {
            let next = direction
                .step(position, size)
                .ok_or(GameError::Blocked(BlockReason::OffBoard))?;
            match board[next] {
                Cell::Wall => return Err(GameError::Blocked(BlockReason::Wall)),
                Cell::Door {
                    number,
                    unlocked: false,
                } => return Err(GameError::Blocked(BlockReason::LockedDoor(number))),
                _ => position = next,
            }
        }

        player.position = position;
        player.moves_left -= distance;
        log::trace!("Player {id} moved {direction:?} x{distance} to {position:?}");
        Ok(MoveOutcome {
            position,
            moves_left: player.moves_left,
        })
    }

    /// Gives up the rest of a player's moves this round.
    pub fn wait(&mut self, id: PlayerId) -> Result<()> {
        self.check_accepting_moves()?;
        Self::active_player(&mut self.players, id)?.moves_left = 0;
        Ok(())
    }

    pub fn all_moves_spent(&self) -> bool {
        self.players
            .iter()
            .filter(|player| !player.eliminated)
            .all(|player| player.moves_left == 0)
    }

    /// Closes the move window, runs the ghost phase and resolves the round.
    ///
    /// When the game goes on the next round is opened before returning.
    pub fn finish_round(&mut self) -> Result<RoundReport> {
        self.check_accepting_moves()?;

        let ghost_moves = self.ghost_phase();
        let mut report = self.resolve();
        report.ghost_moves = ghost_moves;

        match report.outcome {
            RoundOutcome::Continue => self.begin_round(),
            RoundOutcome::Won(reason) => self.end_game(EngineState::Won, Some(reason)),
            RoundOutcome::Lost => self.end_game(EngineState::Lost, None),
        }
        Ok(report)
    }

    pub fn abort(&mut self) -> Result<()> {
        self.check_not_finished()?;
        self.end_game(EngineState::Aborted, None);
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        let size = usize::from(self.board.size());
        let mut tiles = vec![Vec::with_capacity(size); size];
        for ((row, _), cell) in self.board.iter() {
            tiles[usize::from(row)].push(TileView {
                color: cell.color(),
                label: cell.label(),
            });
        }

        Snapshot {
            tiles,
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| GhostView {
                    row: ghost.position.0,
                    column: ghost.position.1,
                    glyph: ghost.kind.glyph(),
                })
                .collect(),
            players: self
                .players
                .iter()
                .filter(|player| !player.eliminated)
                .map(|player| PlayerView {
                    row: player.position.0,
                    column: player.position.1,
                    number: player.id,
                })
                .collect(),
            round: self.round,
            candy_collected: self.candy_collected,
            candy_limit: self.config.candy_limit,
            frenzy: self.frenzy,
            state: self.state,
        }
    }

    fn begin_round(&mut self) {
        self.round += 1;
        for player in self.players.iter_mut().filter(|player| !player.eliminated) {
            player.moves_left = self.config.moves_per_round;
        }
        self.state = EngineState::RoundLoop;
        log::debug!("Round {} open for moves", self.round);
    }

    fn ghost_phase(&mut self) -> Vec<GhostMove> {
        self.state = EngineState::GhostPhase;

        self.rounds_without_capture += 1;
        if self.rounds_without_capture % self.config.frenzy_interval == 0 {
            self.frenzy = self.frenzy.saturating_add(1);
            for ghost in &mut self.ghosts {
                ghost.moves_per_turn = ghost.moves_per_turn.saturating_add(1);
            }
            log::debug!(
                "No capture for {} rounds, frenzy level {}",
                self.rounds_without_capture,
                self.frenzy
            );
        }

        let haunt_bonus = u8::from(self.mimikyu_haunt);
        self.mimikyu_haunt = false;
        self.mimikyu_trapped = false;

        let targets = self.survivor_positions();
        let pursuer = Pursuer::new(&self.board, self.config.move_ghost_attempts);
        let mut moves = Vec::with_capacity(self.ghosts.len());
        for ghost in &mut self.ghosts {
            let is_mimikyu = ghost.kind.is_mimikyu();
            let budget = if is_mimikyu {
                ghost.moves_per_turn.saturating_add(haunt_bonus)
            } else {
                ghost.moves_per_turn
            };

            let step = pursuer.pursue(ghost, &targets, budget, &mut self.rng);
            match step {
                PursuitStep::Unreachable if is_mimikyu => self.mimikyu_trapped = true,
                PursuitStep::Advanced { path_len, .. }
                    if is_mimikyu && path_len == usize::from(budget) =>
                {
                    self.mimikyu_haunt = true;
                }
                _ if !is_mimikyu && step.moved() => self.mimikyu_trapped = false,
                _ => {}
            }

            if let PursuitStep::Advanced { from, to, .. } = step {
                if from != to {
                    moves.push(GhostMove {
                        kind: ghost.kind,
                        from,
                        to,
                    });
                }
            }
        }

        log::debug!(
            "Ghost phase of round {}: {} ghosts moved",
            self.round,
            moves.len()
        );
        moves
    }

    fn resolve(&mut self) -> RoundReport {
        self.state = EngineState::Resolution;

        let mut eliminated = Vec::new();
        for player in self.players.iter_mut().filter(|player| !player.eliminated) {
            let caught = self.ghosts.iter().any(|ghost| {
                if ghost.kind.is_mimikyu() {
                    self.mimikyu_haunt && ghost.catches(player.position, true)
                } else {
                    ghost.catches(player.position, ghost.haunt_next_turn)
                }
            });
            if caught {
                player.eliminated = true;
                player.moves_left = 0;
                eliminated.push(player.id);
            }
        }

        if !eliminated.is_empty() {
            let removed = self.frenzy;
            self.frenzy = 0;
            self.rounds_without_capture = 0;
            for ghost in &mut self.ghosts {
                ghost.moves_per_turn = ghost.moves_per_turn.saturating_sub(removed);
            }
            log::debug!("Players {eliminated:?} caught, frenzy {removed} cleared");
        }

        let mut candy = Vec::new();
        let mut doors_unlocked = Vec::new();
        for player in self.players.iter().filter(|player| !player.eliminated) {
            if self.board.take_candy(player.position) {
                let amount = self
                    .rng
                    .random_range(self.config.candy_value_min..=self.config.candy_value_max);
                self.candy_collected = self.candy_collected.saturating_add(amount);
                candy.push(CandyPickup {
                    player: player.id,
                    amount,
                });
            }
            let cell = self.board[player.position];
            if let Cell::Switch { door } = cell {
                if self.board.unlock_door(door) {
                    doors_unlocked.push(door);
                }
            }
        }

        let outcome = self.evaluate();
        log::debug!("Round {} resolved: {outcome:?}", self.round);

        RoundReport {
            round: self.round,
            ghost_moves: Vec::new(),
            eliminated,
            candy,
            doors_unlocked,
            frenzy: self.frenzy,
            outcome,
        }
    }

    fn evaluate(&mut self) -> RoundOutcome {
        let survivors = self.survivor_positions();
        if survivors.is_empty() {
            return RoundOutcome::Lost;
        }

        if self.candy_collected >= self.config.candy_limit {
            self.candy_collected = self.config.candy_limit;
            return RoundOutcome::Won(WinReason::CandyLimit);
        }

        if self.mimikyu_trapped {
            return RoundOutcome::Won(WinReason::MimikyuTrapped);
        }

        let pursuer = Pursuer::new(&self.board, self.config.move_ghost_attempts);
        if !self
            .ghosts
            .iter()
            .any(|ghost| pursuer.reaches(ghost.position, &survivors))
        {
            return RoundOutcome::Won(WinReason::GhostsStranded);
        }

        RoundOutcome::Continue
    }

    fn end_game(&mut self, state: EngineState, reason: Option<WinReason>) {
        self.state = state;
        for player in &mut self.players {
            player.moves_left = 0;
        }
        log::info!(
            "Game ended after {} rounds: {state:?} {reason:?}, {} candy (seed {})",
            self.round,
            self.candy_collected,
            self.seed
        );
    }

    fn survivor_positions(&self) -> Vec<Coord2> {
        self.players
            .iter()
            .filter(|player| !player.eliminated)
            .map(|player| player.position)
            .collect()
    }

    fn active_player(players: &mut [PlayerState], id: PlayerId) -> Result<&mut PlayerState> {
        let player = players
            .iter_mut()
            .find(|player| player.id == id)
            .ok_or(GameError::UnknownPlayer(id))?;
        if player.eliminated {
            return Err(GameError::PlayerEliminated(id));
        }
        Ok(player)
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }

    fn check_accepting_moves(&self) -> Result<()> {
        self.check_not_finished()?;
        if self.state.accepts_moves() {
            Ok(())
        } else {
            Err(GameError::NotAcceptingMoves)
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn engine_with(
        config: GameConfig,
        rows: &[&str],
        ghosts: &[(GhostKind, Coord2)],
        players: u32,
    ) -> PlayEngine {
        let layout = Layout {
            board: Board::from_ascii(rows).unwrap(),
            ghosts: ghosts
                .iter()
                .map(|&(kind, position)| Ghost::new(kind, position))
                .collect(),
            seed: 0,
            attempts: 1,
        };
        let ids: Vec<_> = (1..=players).collect();
        let mut engine =
            PlayEngine::from_layout(config, layout, &ids, SmallRng::seed_from_u64(0)).unwrap();
        engine.start().unwrap();
        engine
    }

    fn engine(rows: &[&str], ghosts: &[(GhostKind, Coord2)], players: u32) -> PlayEngine {
        engine_with(GameConfig::default(), rows, ghosts, players)
    }

    const CORRIDOR: &[&str] = &["E....", "#####", "#####", "#####", "#####"];
    const BOXED: &[&str] = &["E....", ".....", "#####", "#.#..", "#####"];

    #[test]
    fn moves_are_validated_before_applying() {
        let rows = &["E.#", ".1.", "..."];
        let mut engine = engine(rows, &[], 2);

        assert_eq!(
            engine.move_player(1, Direction::Right, 1),
            Ok(MoveOutcome {
                position: (0, 1),
                moves_left: 2
            })
        );
        assert_eq!(
            engine.move_player(1, Direction::Right, 1),
            Err(GameError::Blocked(BlockReason::Wall))
        );
        assert_eq!(
            engine.move_player(1, Direction::Up, 1),
            Err(GameError::Blocked(BlockReason::OffBoard))
        );
        assert_eq!(engine.player(1).unwrap().moves_left, 2);

        engine.move_player(2, Direction::Down, 1).unwrap();
        assert_eq!(
            engine.move_player(2, Direction::Right, 1),
            Err(GameError::Blocked(BlockReason::LockedDoor(1)))
        );
        assert_eq!(
            engine.move_player(2, Direction::Down, 0),
            Err(GameError::ZeroDistance)
        );
        assert_eq!(
            engine.move_player(2, Direction::Down, 3),
            Err(GameError::NotEnoughMoves {
                requested: 3,
                remaining: 2
            })
        );
        assert_eq!(
            engine.move_player(9, Direction::Down, 1),
            Err(GameError::UnknownPlayer(9))
        );
        assert_eq!(engine.player(2).unwrap().position, (1, 0));
    }

    #[test]
    fn moves_wait_for_the_round_to_open() {
        let layout = Layout {
            board: Board::from_ascii(CORRIDOR).unwrap(),
            ghosts: Vec::new(),
            seed: 0,
            attempts: 1,
        };
        let mut engine = PlayEngine::from_layout(
            GameConfig::default(),
            layout,
            &[1],
            SmallRng::seed_from_u64(0),
        )
        .unwrap();

        assert_eq!(
            engine.move_player(1, Direction::Right, 1),
            Err(GameError::NotAcceptingMoves)
        );
        assert_eq!(engine.finish_round(), Err(GameError::NotAcceptingMoves));
        assert_eq!(engine.start(), Ok(1));
        assert_eq!(engine.start(), Ok(1));
        assert!(engine.move_player(1, Direction::Right, 1).is_ok());
    }

    #[test]
    fn waiting_spends_the_round() {
        let mut engine = engine(CORRIDOR, &[(GhostKind::Haunter, (0, 4))], 2);

        engine.wait(1).unwrap();
        assert!(!engine.all_moves_spent());
        engine.move_player(2, Direction::Right, 3).unwrap();

        assert!(engine.all_moves_spent());
    }

    #[test]
    fn duplicate_players_are_rejected() {
        let layout = Layout {
            board: Board::from_ascii(CORRIDOR).unwrap(),
            ghosts: Vec::new(),
            seed: 0,
            attempts: 1,
        };

        let result = PlayEngine::from_layout(
            GameConfig::default(),
            layout,
            &[1, 2, 1],
            SmallRng::seed_from_u64(0),
        );

        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn engines_built_from_a_layout_check_the_config() {
        let configs = [
            GameConfig {
                frenzy_interval: 0,
                ..GameConfig::default()
            },
            GameConfig {
                candy_value_min: 20,
                candy_value_max: 5,
                ..GameConfig::default()
            },
        ];

        for config in configs {
            let layout = Layout {
                board: Board::from_ascii(CORRIDOR).unwrap(),
                ghosts: vec![Ghost::new(GhostKind::Haunter, (0, 4))],
                seed: 0,
                attempts: 1,
            };
            let result =
                PlayEngine::from_layout(config, layout, &[1], SmallRng::seed_from_u64(0));

            assert!(
                matches!(result, Err(GameError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn gengar_catches_a_player_two_cells_away() {
        let mut engine = engine(CORRIDOR, &[(GhostKind::Gengar, (0, 4))], 1);
        engine.move_player(1, Direction::Right, 2).unwrap();

        let report = engine.finish_round().unwrap();

        assert_eq!(
            report.ghost_moves,
            vec![GhostMove {
                kind: GhostKind::Gengar,
                from: (0, 4),
                to: (0, 2)
            }]
        );
        assert_eq!(report.eliminated, vec![1]);
        assert_eq!(report.outcome, RoundOutcome::Lost);
        assert_eq!(engine.state(), EngineState::Lost);
    }

    #[test]
    fn haunter_closes_in_one_step() {
        let mut engine = engine(CORRIDOR, &[(GhostKind::Haunter, (0, 4))], 1);
        engine.move_player(1, Direction::Right, 2).unwrap();

        let report = engine.finish_round().unwrap();

        assert_eq!(engine.ghosts()[0].position, (0, 3));
        assert!(report.eliminated.is_empty());
        assert_eq!(report.outcome, RoundOutcome::Continue);
        assert_eq!(engine.round(), 2);
        assert_eq!(engine.player(1).unwrap().moves_left, 3);
    }

    #[test]
    fn dusclops_reaches_diagonally() {
        let rows = &["E.###", "#..##", "#####", "#####", "#####"];
        let mut haunted = engine(rows, &[(GhostKind::Dusclops, (1, 2))], 1);
        let mut plain = engine(rows, &[(GhostKind::Haunter, (1, 2))], 1);

        let haunted_report = haunted.finish_round().unwrap();
        let plain_report = plain.finish_round().unwrap();

        assert_eq!(haunted.ghosts()[0].position, (1, 1));
        assert_eq!(haunted_report.outcome, RoundOutcome::Lost);
        assert_eq!(plain.ghosts()[0].position, (1, 1));
        assert_eq!(plain_report.outcome, RoundOutcome::Continue);
    }

    #[test]
    fn boxed_mimikyu_wins_the_game() {
        let mut engine = engine(BOXED, &[(GhostKind::Mimikyu, (3, 1))], 4);

        let report = engine.finish_round().unwrap();

        assert!(engine.mimikyu_trapped());
        assert_eq!(report.outcome, RoundOutcome::Won(WinReason::MimikyuTrapped));
        assert_eq!(engine.state(), EngineState::Won);
    }

    #[test]
    fn moving_ghost_clears_the_trap() {
        let mut engine = engine(
            BOXED,
            &[
                (GhostKind::Haunter, (1, 4)),
                (GhostKind::Mimikyu, (3, 1)),
            ],
            1,
        );

        let report = engine.finish_round().unwrap();

        assert_eq!(engine.ghosts()[0].kind, GhostKind::Mimikyu);
        assert!(!engine.mimikyu_trapped());
        assert_eq!(report.outcome, RoundOutcome::Continue);
    }

    #[test]
    fn stranded_ghosts_win_the_game() {
        let mut engine = engine(BOXED, &[(GhostKind::Haunter, (3, 1))], 2);

        let report = engine.finish_round().unwrap();

        assert!(report.ghost_moves.is_empty());
        assert_eq!(report.outcome, RoundOutcome::Won(WinReason::GhostsStranded));
    }

    #[test]
    fn mimikyu_catches_only_when_haunting() {
        let mut engine = engine(CORRIDOR, &[(GhostKind::Mimikyu, (0, 4))], 1);

        let first = engine.finish_round().unwrap();
        assert_eq!(engine.ghosts()[0].position, (0, 2));
        assert!(!engine.mimikyu_haunt());
        assert_eq!(first.outcome, RoundOutcome::Continue);

        let second = engine.finish_round().unwrap();
        assert_eq!(engine.ghosts()[0].position, (0, 0));
        assert!(engine.mimikyu_haunt());
        assert_eq!(second.eliminated, vec![1]);
        assert_eq!(second.outcome, RoundOutcome::Lost);
    }

    const PUZZLE: &[&str] = &[
        "E*a....",
        "######.",
        "######.",
        "######.",
        "######1",
        "######.",
        "######.",
    ];

    #[test]
    fn candy_and_switches_resolve_at_round_end() {
        let mut engine = engine(PUZZLE, &[(GhostKind::Haunter, (3, 6))], 2);
        engine.move_player(1, Direction::Right, 1).unwrap();
        engine.move_player(2, Direction::Right, 2).unwrap();
        assert_eq!(
            engine.board()[(4, 6)],
            Cell::Door {
                number: 1,
                unlocked: false
            }
        );

        let report = engine.finish_round().unwrap();

        assert_eq!(report.candy.len(), 1);
        assert_eq!(report.candy[0].player, 1);
        assert!((5..=15).contains(&report.candy[0].amount));
        assert_eq!(engine.candy_collected(), report.candy[0].amount);
        assert_eq!(engine.board()[(0, 1)], Cell::Candy { has_candy: false });
        assert_eq!(report.doors_unlocked, vec![1]);
        assert_eq!(
            engine.board()[(4, 6)],
            Cell::Door {
                number: 1,
                unlocked: true
            }
        );
        assert_eq!(report.outcome, RoundOutcome::Continue);
    }

    #[test]
    fn candy_limit_wins_and_clamps() {
        let config = GameConfig {
            candy_limit: 5,
            ..GameConfig::default()
        };
        let mut engine = engine_with(config, PUZZLE, &[(GhostKind::Haunter, (3, 6))], 1);
        engine.move_player(1, Direction::Right, 1).unwrap();

        let report = engine.finish_round().unwrap();

        assert_eq!(report.outcome, RoundOutcome::Won(WinReason::CandyLimit));
        assert_eq!(engine.candy_collected(), 5);
        assert_eq!(engine.snapshot().candy_collected, 5);
    }

    #[test]
    fn four_players_until_a_capture() {
        let rows: Vec<String> = (0..15)
            .map(|row| {
                let fill = if row == 0 { '.' } else { '#' };
                let mut line: String = core::iter::repeat_n(fill, 15).collect();
                if row == 0 {
                    line.replace_range(0..1, "E");
                }
                line
            })
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let mut engine = engine(&rows, &[(GhostKind::Haunter, (0, 14))], 4);

        for round in 1..=10 {
            for id in 1..=4 {
                engine.wait(id).unwrap();
            }
            assert!(engine.all_moves_spent());
            let report = engine.finish_round().unwrap();
            assert_eq!(report.outcome, RoundOutcome::Continue, "round {round}");
            assert!(report.eliminated.is_empty());
        }
        assert_eq!(engine.state(), EngineState::RoundLoop);
        assert_eq!(engine.frenzy(), 1);
        assert_eq!(engine.ghosts()[0].moves_per_turn, 2);
        assert_eq!(engine.ghosts()[0].position, (0, 3));

        engine.move_player(1, Direction::Right, 2).unwrap();
        let report = engine.finish_round().unwrap();

        assert_eq!(report.eliminated, vec![1]);
        assert_eq!(report.outcome, RoundOutcome::Continue);
        assert_eq!(engine.frenzy(), 0);
        assert_eq!(engine.rounds_without_capture(), 0);
        assert_eq!(engine.ghosts()[0].moves_per_turn, 1);
        assert_eq!(
            engine.move_player(1, Direction::Left, 1),
            Err(GameError::PlayerEliminated(1))
        );
        assert_eq!(engine.snapshot().players.len(), 3);
    }

    #[test]
    fn everyone_caught_is_a_loss() {
        let mut engine = engine(CORRIDOR, &[(GhostKind::Haunter, (0, 1))], 3);

        let report = engine.finish_round().unwrap();

        assert_eq!(report.eliminated, vec![1, 2, 3]);
        assert_eq!(report.outcome, RoundOutcome::Lost);
        assert_eq!(engine.finish_round(), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn snapshot_projects_board_and_pieces() {
        let engine = engine(PUZZLE, &[(GhostKind::Haunter, (3, 6))], 2);

        let snapshot = engine.snapshot();

        assert_eq!(snapshot.tiles.len(), 7);
        assert!(snapshot.tiles.iter().all(|row| row.len() == 7));
        assert_eq!(snapshot.tiles[0][1].label, '*');
        assert_eq!(snapshot.tiles[4][6].label, '1');
        assert_eq!(snapshot.tiles[1][0].color, Cell::Wall.color());
        assert_eq!(
            snapshot.ghosts,
            vec![GhostView {
                row: 3,
                column: 6,
                glyph: 'H'
            }]
        );
        assert_eq!(snapshot.players[1], PlayerView { row: 0, column: 0, number: 2 });
        assert_eq!(snapshot.round, 1);
        assert!(serde_json::to_string(&snapshot).is_ok());
    }

    #[test]
    fn abort_ends_the_game_once() {
        let mut engine = engine(CORRIDOR, &[(GhostKind::Haunter, (0, 4))], 1);

        assert_eq!(engine.abort(), Ok(()));
        assert_eq!(engine.state(), EngineState::Aborted);
        assert_eq!(engine.abort(), Err(GameError::AlreadyEnded));
        assert_eq!(
            engine.move_player(1, Direction::Right, 1),
            Err(GameError::AlreadyEnded)
        );
    }

    #[test]
    fn setup_is_reproducible() {
        let players = [10, 20, 30, 40];
        let first = PlayEngine::setup(GameConfig::default(), Some(42), &players).unwrap();
        let second = PlayEngine::setup(GameConfig::default(), Some(42), &players).unwrap();

        assert_eq!(first.seed(), 42);
        assert_eq!(first.state(), EngineState::Setup);
        assert_eq!(first.board(), second.board());
        assert_eq!(first.ghosts(), second.ghosts());
        assert_eq!(first.ghosts().len(), 8);
        let entry = first.board().entry();
        assert!(first.players().iter().all(|player| player.position == entry));
    }

    #[test]
    fn setup_reports_the_seed_on_failure() {
        let config = GameConfig {
            board_size: 3,
            setup_board_attempts: 3,
            ..GameConfig::default()
        };

        assert_eq!(
            PlayEngine::setup(config, Some(8), &[1]).err(),
            Some(GameError::GenerationFailed {
                seed: 8,
                attempts: 3
            })
        );
    }
}
