//! Keyboard sampling into the local paddles' input buffers.

use crate::game::GameLoop;
use macroquad::prelude::*;
use shared::{Direction, Message, PlayerId};

/// Keys driving one locally controlled paddle.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub player_id: PlayerId,
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
}

/// One sampled key level for a local paddle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySample {
    pub player_id: PlayerId,
    pub direction: Direction,
    pub pressed: bool,
}

/// Samples the keyboard every render callback and turns changes into outgoing
/// input messages.
pub struct InputManager {
    bindings: Vec<KeyBindings>,
    show_hud: bool,
    prev_key_h: bool,
}

impl InputManager {
    pub fn new(bindings: Vec<KeyBindings>) -> Self {
        Self {
            bindings,
            show_hud: false,
            prev_key_h: false,
        }
    }

    /// W/S or the arrow keys drive a single networked paddle.
    pub fn networked(player_id: PlayerId) -> Self {
        Self::new(vec![KeyBindings {
            player_id,
            up: vec![KeyCode::W, KeyCode::Up],
            down: vec![KeyCode::S, KeyCode::Down],
        }])
    }

    /// W/S drive the left paddle, the arrow keys the right one.
    pub fn offline(left: PlayerId, right: PlayerId) -> Self {
        Self::new(vec![
            KeyBindings {
                player_id: left,
                up: vec![KeyCode::W],
                down: vec![KeyCode::S],
            },
            KeyBindings {
                player_id: right,
                up: vec![KeyCode::Up],
                down: vec![KeyCode::Down],
            },
        ])
    }

    /// Reads the keyboard and returns the messages to transmit.
    pub fn update(&mut self, game: &mut GameLoop) -> Vec<Message> {
        let key_h = is_key_down(KeyCode::H);
        if key_h && !self.prev_key_h {
            self.show_hud = !self.show_hud;
        }
        self.prev_key_h = key_h;

        let samples: Vec<KeySample> = self
            .bindings
            .iter()
            .flat_map(|binding| {
                [
                    (Direction::Up, &binding.up),
                    (Direction::Down, &binding.down),
                ]
                .into_iter()
                .map(move |(direction, keys)| KeySample {
                    player_id: binding.player_id.clone(),
                    direction,
                    pressed: keys.iter().any(|key| is_key_down(*key)),
                })
            })
            .collect();

        apply_samples(game, &samples)
    }

    pub fn show_hud(&self) -> bool {
        self.show_hud
    }
}

/// Feeds sampled key levels to the driver. Only actual transitions produce messages.
pub fn apply_samples(game: &mut GameLoop, samples: &[KeySample]) -> Vec<Message> {
    samples
        .iter()
        .filter_map(|sample| game.set_local_key(&sample.player_id, sample.direction, sample.pressed))
        .collect()
}
