//! Fixed-timestep game loop driver.
//!
//! The host calls [`GameLoop::advance`] once per render callback with the current
//! wall-clock time. Elapsed time is clamped and accumulated, and the board is
//! stepped in whole ticks, each tagged with the next frame id. Incoming messages
//! are fed through [`GameLoop::handle_message`] between callbacks, so nothing
//! touches the board mid-tick.

use log::{debug, info, warn};
use shared::{
    Board, ControlAction, Direction, FrameId, InputMessage, Message, PlayerId, TimingConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Created,
    CountingDown,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    RemoteStop,
    Unrecognized(String),
    MatchOver { winner: PlayerId },
    Destroyed,
}

/// What one call to [`GameLoop::advance`] simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub ticks: u32,
    pub first_frame: Option<FrameId>,
    pub last_frame: Option<FrameId>,
}

pub struct GameLoop {
    board: Board,
    local_players: Vec<PlayerId>,
    timing: TimingConfig,
    state: LoopState,
    stop_reason: Option<StopReason>,
    server_start_ms: u64,
    start_frame: FrameId,
    frame: FrameId,
    accumulator: f64,
    last_time_ms: Option<u64>,
    released: bool,
}

impl GameLoop {
    pub fn new(board: Board, local_players: Vec<PlayerId>, timing: TimingConfig) -> Self {
        Self {
            board,
            local_players,
            timing,
            state: LoopState::Created,
            stop_reason: None,
            server_start_ms: 0,
            start_frame: 0,
            frame: 0,
            accumulator: 0.0,
            last_time_ms: None,
            released: false,
        }
    }

    /// Schedules the match to run from `server_start_ms`. A client arriving
    /// after that instant starts at the frame that has already elapsed.
    pub fn start_at(&mut self, server_start_ms: u64, now_ms: u64) {
        if self.state != LoopState::Created {
            warn!("Ignoring start request while {:?}", self.state);
            return;
        }

        self.server_start_ms = server_start_ms;
        self.start_frame = self.frames_elapsed_since_start(now_ms);
        self.frame = self.start_frame;
        self.state = LoopState::CountingDown;

        info!(
            "Match scheduled in {}ms, starting at frame {}",
            server_start_ms.saturating_sub(now_ms),
            self.start_frame
        );
    }

    /// Runs every whole tick that fits in the time since the previous call.
    pub fn advance(&mut self, now_ms: u64) -> FrameReport {
        let mut report = FrameReport::default();

        match self.state {
            LoopState::Created | LoopState::Stopped => return report,
            LoopState::CountingDown => {
                if now_ms < self.server_start_ms {
                    return report;
                }
                // Count from the instant the start frame began, not from this
                // callback, so the frame id tracks the shared clock.
                self.state = LoopState::Running;
                self.last_time_ms = Some(self.start_frame_time_ms());
                info!("Match running from frame {}", self.frame);
            }
            LoopState::Running => {}
        }

        let last = self.last_time_ms.unwrap_or(now_ms);
        let elapsed = now_ms.saturating_sub(last) as f64 / 1000.0;
        self.last_time_ms = Some(now_ms);
        self.accumulator += elapsed.min(self.timing.max_frame_delta as f64);

        let tick = 1.0 / self.timing.tick_rate as f64;
        while self.accumulator >= tick && self.state == LoopState::Running {
            self.accumulator -= tick;
            self.frame += 1;
            self.step();

            report.ticks += 1;
            report.first_frame.get_or_insert(self.frame);
            report.last_frame = Some(self.frame);
        }

        report
    }

    fn step(&mut self) {
        let frame = self.frame;

        for id in self.board.player_ids().to_vec() {
            let is_local = self.local_players.contains(&id);
            let Some(paddle) = self.board.get_paddle_by_player_id_mut(&id) else {
                continue;
            };

            if is_local {
                let hold = paddle.input.current_hold_state();
                paddle.set_hold_state(hold.up, hold.down);
            } else if let Some(snapshot) = paddle.input.remote_snapshot_at(frame) {
                paddle.apply_inputs(snapshot);
            } else {
                let hold = paddle.input.hold_state_fallback_at(frame);
                paddle.set_hold_state(hold.up, hold.down);
            }
        }

        if self.board.update(self.timing.tick_seconds()).is_some() {
            if let Some(winner) = self.board.winner().cloned() {
                info!("{} reached the score limit", winner);
                self.stop(StopReason::MatchOver { winner });
            }
        }
    }

    /// Records a local key change for one of this client's paddles. Returns the
    /// message to transmit when the key actually changed state.
    pub fn set_local_key(
        &mut self,
        player_id: &str,
        direction: Direction,
        pressed: bool,
    ) -> Option<Message> {
        if !self.local_players.iter().any(|id| id == player_id) {
            return None;
        }
        let frame = self.frame;
        let paddle = self.board.get_paddle_by_player_id_mut(player_id)?;
        let input_frame = paddle
            .input
            .set_local_key_and_maybe_emit_frame(direction, pressed, frame)?;

        Some(Message::Input(InputMessage {
            user_id: player_id.to_string(),
            inputs: vec![input_frame],
        }))
    }

    pub fn handle_message(&mut self, message: Message) {
        if self.state == LoopState::Stopped {
            return;
        }

        match message {
            Message::Input(input) => {
                match self.board.get_paddle_by_player_id_mut(&input.user_id) {
                    Some(paddle) => paddle.input.record_remote_frames(&input.inputs),
                    None => debug!("Input for unknown player {}", input.user_id),
                }
            }
            Message::GameState(state) => {
                debug!("Authoritative update for frame {}", state.frame_id);
                self.board.apply_update(&state);
            }
            Message::Control(control) => match control.action {
                ControlAction::Stopped => self.stop(StopReason::RemoteStop),
                ControlAction::Start => debug!("Ignoring start for a match already set up"),
            },
            Message::Player(player) => {
                info!(
                    "Player {} ({}) {:?}",
                    player.display_name, player.player_id, player.action
                );
            }
            Message::Unrecognized { kind } => {
                warn!("Unrecognized message `{}`, ending match", kind);
                self.stop(StopReason::Unrecognized(kind));
            }
        }
    }

    pub fn stop(&mut self, reason: StopReason) {
        if self.state == LoopState::Stopped {
            return;
        }
        info!("Stopping game loop: {:?}", reason);
        self.state = LoopState::Stopped;
        self.stop_reason = Some(reason);
    }

    /// Stops the loop and clears every snapshot table.
    pub fn destroy(&mut self) {
        self.stop(StopReason::Destroyed);
        self.board.clear_inputs();
        self.released = true;
    }

    /// Clears the snapshot tables once the loop has stopped, keeping the stop
    /// reason for the result screen. Returns `true` only on the call that
    /// released them.
    pub fn release_if_stopped(&mut self) -> bool {
        if self.state != LoopState::Stopped || self.released {
            return false;
        }
        self.board.clear_inputs();
        self.released = true;
        true
    }

    /// Whole seconds left before the match starts, while counting down.
    pub fn countdown_remaining(&self, now_ms: u64) -> Option<u64> {
        if self.state != LoopState::CountingDown {
            return None;
        }
        let remaining_ms = self.server_start_ms.saturating_sub(now_ms);
        Some((remaining_ms + 999) / 1000)
    }

    pub fn get_current_frame(&self) -> FrameId {
        self.frame
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == LoopState::Stopped
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn local_players(&self) -> &[PlayerId] {
        &self.local_players
    }

    fn start_frame_time_ms(&self) -> u64 {
        self.server_start_ms + self.start_frame * 1000 / self.timing.tick_rate as u64
    }

    fn frames_elapsed_since_start(&self, now_ms: u64) -> FrameId {
        let elapsed_ms = now_ms.saturating_sub(self.server_start_ms);
        elapsed_ms * self.timing.tick_rate as FrameId / 1000
    }
}
