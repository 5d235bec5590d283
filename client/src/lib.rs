//! # Paddle Game Client Library
//!
//! Client-side real-time core of the networked paddle-and-ball game. It predicts
//! the local paddle ahead of server confirmation, reconciles remote paddles
//! against per-frame input snapshots, and advances a deterministic fixed-timestep
//! simulation for rendering.
//!
//! ## Architecture Overview
//!
//! ### Client-Side Prediction
//! Local key changes are written to the paddle's input buffer and applied on the
//! very next tick. They are also sent to the server tagged with the frame they
//! belong to, but only when a key actually changes state.
//!
//! ### Remote Reconciliation
//! Input frames from other players land in a per-paddle snapshot table keyed by
//! frame id. Each tick uses the exact snapshot for the current frame when one
//! exists and otherwise the nearest earlier one within a bounded lookback window,
//! so remote paddles keep moving between sparse updates.
//!
//! ### Authoritative Correction
//! Full game-state snapshots overwrite the ball and paddles directly. There is no
//! smoothing: a visible snap is preferred over hiding a real divergence.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The fixed-timestep driver: countdown, frame-id bookkeeping, the accumulator
//! loop and message dispatch.
//!
//! ### Session Module (`session`)
//! Startup precondition checks and the offline two-player setup.
//!
//! ### Input Module (`input`)
//! Keyboard sampling with per-paddle key bindings.
//!
//! ### Network Module (`network`)
//! WebSocket transport on a background runtime thread.
//!
//! ### Rendering Module (`rendering`)
//! macroquad drawing of the field, countdown, results and error screens.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::GameLoop;
//! use client::session::{launch, LaunchContext};
//! use client::utils::get_timestamp;
//! use shared::GameConfig;
//!
//! let context = LaunchContext::offline(GameConfig::new(), get_timestamp(), 42);
//! let mut game: GameLoop = launch(context, get_timestamp())?;
//!
//! loop {
//!     // Feed transport messages with `game.handle_message(..)` here.
//!     game.advance(get_timestamp());
//!     if game.is_stopped() {
//!         break;
//!     }
//! }
//! game.destroy();
//! # Ok::<(), client::session::StartupError>(())
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod session;
pub mod utils;
