//! Startup precondition checks and construction of a [`GameLoop`].
//!
//! Every missing dependency here is fatal: the caller shows the error in place of
//! the game surface and never starts ticking.

use crate::game::GameLoop;
use log::info;
use shared::{
    Board, BoardError, ConfigError, ControlAction, ControlPayload, GameConfig, PlayerId, Side,
};
use std::collections::HashMap;
use thiserror::Error;

pub const OFFLINE_LEFT_PLAYER: &str = "left";
pub const OFFLINE_RIGHT_PLAYER: &str = "right";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("no game configuration available")]
    MissingConfig,
    #[error("invalid game configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("no local player id available")]
    MissingLocalPlayer,
    #[error("no start message received for this match")]
    MissingStartPayload,
    #[error("start message is missing `{0}`")]
    IncompleteStartPayload(&'static str),
    #[error("transport channel is not open")]
    TransportClosed,
    #[error("local player {0} has no seat in this match")]
    LocalPlayerNotSeated(PlayerId),
    #[error("cannot build board: {0}")]
    Board(#[from] BoardError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Networked,
    /// Two players on one keyboard, no transport.
    Offline,
}

/// Everything the driver needs before it can start.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub mode: Mode,
    pub config: Option<GameConfig>,
    pub local_player: Option<PlayerId>,
    pub pending_start: Option<ControlPayload>,
    pub transport_open: bool,
    pub seed: u64,
}

impl LaunchContext {
    /// Context for a local two-player match starting immediately.
    pub fn offline(config: GameConfig, now_ms: u64, seed: u64) -> Self {
        let player_sides: HashMap<PlayerId, Side> = [
            (OFFLINE_LEFT_PLAYER.to_string(), Side::Left),
            (OFFLINE_RIGHT_PLAYER.to_string(), Side::Right),
        ]
        .into_iter()
        .collect();

        Self {
            mode: Mode::Offline,
            config: Some(config),
            local_player: Some(OFFLINE_LEFT_PLAYER.to_string()),
            pending_start: Some(ControlPayload {
                action: ControlAction::Start,
                game_id: None,
                player_sides: Some(player_sides),
                start_time: Some(now_ms),
            }),
            transport_open: false,
            seed,
        }
    }
}

/// Validates the launch context and returns a driver already counting down.
pub fn launch(context: LaunchContext, now_ms: u64) -> Result<GameLoop, StartupError> {
    let config = context.config.ok_or(StartupError::MissingConfig)?;
    config.validate()?;

    let local_player = context.local_player.ok_or(StartupError::MissingLocalPlayer)?;
    let start = context
        .pending_start
        .filter(|start| start.action == ControlAction::Start)
        .ok_or(StartupError::MissingStartPayload)?;
    let player_sides = start
        .player_sides
        .ok_or(StartupError::IncompleteStartPayload("playerSides"))?;
    let start_time = start
        .start_time
        .ok_or(StartupError::IncompleteStartPayload("startTime"))?;

    if context.mode == Mode::Networked && !context.transport_open {
        return Err(StartupError::TransportClosed);
    }
    if !player_sides.contains_key(&local_player) {
        return Err(StartupError::LocalPlayerNotSeated(local_player));
    }

    let board = Board::new(&player_sides, &config, context.seed)?
        .with_local_scoring(context.mode == Mode::Offline);

    let local_players = match context.mode {
        Mode::Networked => vec![local_player],
        Mode::Offline => board.player_ids().to_vec(),
    };
    info!(
        "Launching {:?} match {} with local players {:?}",
        context.mode,
        start.game_id.as_deref().unwrap_or("-"),
        local_players
    );

    let mut game = GameLoop::new(board, local_players, config.timing);
    game.start_at(start_time, now_ms);
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::LoopState;

    const NOW: u64 = 5_000_000;

    fn networked() -> LaunchContext {
        let player_sides: HashMap<PlayerId, Side> = [
            ("alice".to_string(), Side::Left),
            ("bob".to_string(), Side::Right),
        ]
        .into_iter()
        .collect();

        LaunchContext {
            mode: Mode::Networked,
            config: Some(GameConfig::new()),
            local_player: Some("alice".to_string()),
            pending_start: Some(ControlPayload {
                action: ControlAction::Start,
                game_id: Some("g-1".to_string()),
                player_sides: Some(player_sides),
                start_time: Some(NOW + 3_000),
            }),
            transport_open: true,
            seed: 0,
        }
    }

    #[test]
    fn test_networked_launch_counts_down() {
        let game = launch(networked(), NOW).unwrap();
        assert_eq!(game.state(), LoopState::CountingDown);
        assert_eq!(game.local_players(), ["alice".to_string()]);
        assert_eq!(game.countdown_remaining(NOW), Some(3));
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let mut context = networked();
        context.config = None;
        assert!(matches!(launch(context, NOW), Err(StartupError::MissingConfig)));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut context = networked();
        let mut config = GameConfig::new();
        config.world.width = 0.0;
        context.config = Some(config);
        assert!(matches!(
            launch(context, NOW),
            Err(StartupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_oversized_lookback_is_fatal() {
        let mut context = networked();
        let mut config = GameConfig::new();
        config.timing.lookback_horizon = u32::MAX;
        context.config = Some(config);
        assert!(matches!(
            launch(context, NOW),
            Err(StartupError::InvalidConfig(ConfigError::Invalid {
                field: "timing.lookbackHorizon",
                ..
            }))
        ));
    }

    #[test]
    fn test_missing_local_player_is_fatal() {
        let mut context = networked();
        context.local_player = None;
        assert!(matches!(
            launch(context, NOW),
            Err(StartupError::MissingLocalPlayer)
        ));
    }

    #[test]
    fn test_missing_start_is_fatal() {
        let mut context = networked();
        context.pending_start = None;
        assert!(matches!(
            launch(context, NOW),
            Err(StartupError::MissingStartPayload)
        ));
    }

    #[test]
    fn test_start_without_time_is_fatal() {
        let mut context = networked();
        if let Some(start) = context.pending_start.as_mut() {
            start.start_time = None;
        }
        assert!(matches!(
            launch(context, NOW),
            Err(StartupError::IncompleteStartPayload("startTime"))
        ));
    }

    #[test]
    fn test_closed_transport_is_fatal_when_networked() {
        let mut context = networked();
        context.transport_open = false;
        assert!(matches!(
            launch(context, NOW),
            Err(StartupError::TransportClosed)
        ));
    }

    #[test]
    fn test_unseated_local_player_is_fatal() {
        let mut context = networked();
        context.local_player = Some("carol".to_string());
        assert!(matches!(
            launch(context, NOW),
            Err(StartupError::LocalPlayerNotSeated(id)) if id == "carol"
        ));
    }

    #[test]
    fn test_offline_launch_controls_both_paddles() {
        let context = LaunchContext::offline(GameConfig::new(), NOW, 9);
        let mut game = launch(context, NOW).unwrap();

        assert_eq!(game.local_players().len(), 2);
        assert!(game
            .set_local_key(OFFLINE_RIGHT_PLAYER, shared::Direction::Up, true)
            .is_some());
        game.advance(NOW);
        assert_eq!(game.state(), LoopState::Running);
    }
}
