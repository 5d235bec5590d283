//! Deterministic paddle-and-ball simulation core and wire protocol.
//!
//! Both the client and any authoritative process step the same [`Board`] with the
//! same [`GameConfig`], so identical inputs produce identical motion.

pub mod ball;
pub mod board;
pub mod config;
pub mod input_buffer;
pub mod paddle;
pub mod protocol;
pub mod vector;

pub use ball::{Ball, Goal};
pub use board::{Board, BoardError};
pub use config::{BallConfig, ConfigError, GameConfig, PaddleConfig, TimingConfig, WorldConfig};
pub use input_buffer::{InputBuffer, KeyState};
pub use paddle::Paddle;
pub use protocol::{
    BallSnapshot, ControlAction, ControlPayload, Direction, FrameId, GameStatePayload,
    InputFrame, InputMessage, KeyInput, Message, PaddleSnapshot, PlayerAction, PlayerId,
    PlayerPayload, ProtocolError, ScoreEntry, Side,
};
pub use vector::Vec2;
