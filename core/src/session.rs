use std::collections::VecDeque;

use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use web_time::Instant;

use crate::*;

/// A move-window action taken by one player.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Move {
        player: PlayerId,
        direction: Direction,
        distance: u8,
    },
    Wait {
        player: PlayerId,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Player(PlayerCommand),
    /// Ends the game at once, discarding queued player commands.
    Abort,
}

/// Cloneable sending side of a session mailbox, usable from any thread.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> Result<()> {
        self.sender.unbounded_send(command).map_err(|err| {
            log::warn!("Dropping {:?}, session is closed", err.into_inner());
            GameError::SessionClosed
        })
    }

    pub fn move_player(&self, player: PlayerId, direction: Direction, distance: u8) -> Result<()> {
        self.send(SessionCommand::Player(PlayerCommand::Move {
            player,
            direction,
            distance,
        }))
    }

    pub fn wait(&self, player: PlayerId) -> Result<()> {
        self.send(SessionCommand::Player(PlayerCommand::Wait { player }))
    }

    pub fn abort(&self) -> Result<()> {
        self.send(SessionCommand::Abort)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    RoundStarted { round: u32 },
    Moved { player: PlayerId, outcome: MoveOutcome },
    Waited { player: PlayerId },
    /// Meant for `player` only.
    Rejected { player: PlayerId, error: GameError },
    RoundResolved(RoundReport),
    Ended(EngineState),
}

/// Owns an engine and feeds it the commands queued through its handles.
///
/// All state changes happen inside [`Session::pump`]. Commands that arrive before a round opens
/// stay queued until it does.
#[derive(Debug)]
pub struct Session {
    engine: PlayEngine,
    inbox: UnboundedReceiver<SessionCommand>,
    sender: UnboundedSender<SessionCommand>,
    pending: VecDeque<PlayerCommand>,
    start_timer: Timer,
    round_timer: Timer,
}

impl Session {
    /// Wraps an engine fresh out of setup. The first round opens after the start delay.
    pub fn new(engine: PlayEngine, now: Instant) -> Self {
        let (sender, inbox) = mpsc::unbounded();
        let mut start_timer = Timer::new();
        start_timer.arm(now, engine.config().start_delay());
        Self {
            engine,
            inbox,
            sender,
            pending: VecDeque::new(),
            start_timer,
            round_timer: Timer::new(),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn engine(&self) -> &PlayEngine {
        &self.engine
    }

    /// Earliest moment [`Session::pump`] has timed work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.start_timer.deadline(), self.round_timer.deadline()) {
            (Some(start), Some(round)) => Some(start.min(round)),
            (start, round) => start.or(round),
        }
    }

    /// Applies queued commands and due timers, returning what happened in order.
    pub fn pump(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let mut aborted = false;
        while let Ok(Some(command)) = self.inbox.try_next() {
            match command {
                SessionCommand::Player(command) => self.pending.push_back(command),
                SessionCommand::Abort => aborted = true,
            }
        }

        if aborted {
            self.pending.clear();
            if self.engine.abort().is_ok() {
                self.close(&mut events);
            }
            return events;
        }

        if self.start_timer.poll(now) {
            match self.engine.start() {
                Ok(round) => self.open_round(round, now, &mut events),
                Err(err) => log::warn!("Could not start the game: {err}"),
            }
        }

        if self.engine.state().accepts_moves() {
            while let Some(command) = self.pending.pop_front() {
                events.push(self.apply(command));
            }

            if self.engine.all_moves_spent() || self.round_timer.poll(now) {
                self.resolve_round(now, &mut events);
            }
        }

        events
    }

    fn apply(&mut self, command: PlayerCommand) -> SessionEvent {
        match command {
            PlayerCommand::Move {
                player,
                direction,
                distance,
            } => match self.engine.move_player(player, direction, distance) {
                Ok(outcome) => SessionEvent::Moved { player, outcome },
                Err(error) => SessionEvent::Rejected { player, error },
            },
            PlayerCommand::Wait { player } => match self.engine.wait(player) {
                Ok(()) => SessionEvent::Waited { player },
                Err(error) => SessionEvent::Rejected { player, error },
            },
        }
    }

    fn resolve_round(&mut self, now: Instant, events: &mut Vec<SessionEvent>) {
        self.round_timer.cancel();
        match self.engine.finish_round() {
            Ok(report) => {
                let outcome = report.outcome;
                events.push(SessionEvent::RoundResolved(report));
                if outcome == RoundOutcome::Continue {
                    let round = self.engine.round();
                    self.open_round(round, now, events);
                } else {
                    self.close(events);
                }
            }
            Err(err) => log::warn!("Could not resolve round {}: {err}", self.engine.round()),
        }
    }

    fn open_round(&mut self, round: u32, now: Instant, events: &mut Vec<SessionEvent>) {
        self.round_timer.arm(now, self.engine.config().round_time());
        events.push(SessionEvent::RoundStarted { round });
    }

    fn close(&mut self, events: &mut Vec<SessionEvent>) {
        self.start_timer.cancel();
        self.round_timer.cancel();
        self.inbox.close();
        events.push(SessionEvent::Ended(self.engine.state()));
    }
}
