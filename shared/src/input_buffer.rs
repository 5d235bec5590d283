//! Per-paddle input bookkeeping: local hold flags for prediction and a
//! frame-indexed table of authoritative key snapshots for reconciliation.

use crate::protocol::{Direction, FrameId, InputFrame, KeyInput};
use log::debug;
use serde::{Deserialize, Serialize};

/// Hold flags for both directions of one paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyState {
    pub up: bool,
    pub down: bool,
}

impl KeyState {
    pub const NEUTRAL: KeyState = KeyState {
        up: false,
        down: false,
    };

    pub fn new(up: bool, down: bool) -> Self {
        Self { up, down }
    }

    /// Builds a snapshot from the key list of one frame. Keys not listed are released.
    pub fn from_inputs(inputs: &[KeyInput]) -> Self {
        let mut state = KeyState::NEUTRAL;
        for input in inputs {
            state.set(input.key, input.pressed);
        }
        state
    }

    pub fn get(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
        }
    }

    fn to_inputs(self) -> Vec<KeyInput> {
        vec![
            KeyInput {
                key: Direction::Up,
                pressed: self.up,
            },
            KeyInput {
                key: Direction::Down,
                pressed: self.down,
            },
        ]
    }
}

/// Reconciles local prediction with remote snapshots for one paddle.
///
/// Remote snapshots live in a fixed ring indexed by `frame_id % capacity`. The
/// capacity is twice the lookback window, so a fallback scan never looks at more
/// than `horizon + 1` slots and memory stays bounded no matter how long a match
/// runs. Writes are keyed overwrites and may arrive in any frame order.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    local: KeyState,
    slots: Vec<Option<(FrameId, KeyState)>>,
    horizon: u32,
}

impl InputBuffer {
    pub fn new(horizon: u32) -> Self {
        let capacity = 2 * (horizon as usize + 1);
        Self {
            local: KeyState::NEUTRAL,
            slots: vec![None; capacity],
            horizon,
        }
    }

    pub fn current_hold_state(&self) -> KeyState {
        self.local
    }

    /// Records a local key change. Returns the frame to transmit only when the
    /// stored flag actually flipped; the frame carries the full hold state.
    pub fn set_local_key_and_maybe_emit_frame(
        &mut self,
        direction: Direction,
        pressed: bool,
        frame_id: FrameId,
    ) -> Option<InputFrame> {
        if self.local.get(direction) == pressed {
            return None;
        }
        self.local.set(direction, pressed);

        Some(InputFrame {
            frame_id,
            inputs: self.local.to_inputs(),
        })
    }

    /// Stores each frame's key state, replacing whatever was stored for that frame id.
    pub fn record_remote_frames(&mut self, frames: &[InputFrame]) {
        for frame in frames {
            let index = self.slot_index(frame.frame_id);
            if let Some((stored, _)) = self.slots[index] {
                if stored > frame.frame_id {
                    debug!(
                        "Dropping stale snapshot for frame {} (slot holds frame {})",
                        frame.frame_id, stored
                    );
                    continue;
                }
            }
            self.slots[index] = Some((frame.frame_id, KeyState::from_inputs(&frame.inputs)));
        }
    }

    pub fn remote_snapshot_at(&self, frame_id: FrameId) -> Option<KeyState> {
        match self.slots[self.slot_index(frame_id)] {
            Some((stored, state)) if stored == frame_id => Some(state),
            _ => None,
        }
    }

    /// Exact snapshot if present, else the nearest earlier one within the
    /// lookback horizon, else neutral.
    pub fn hold_state_fallback_at(&self, frame_id: FrameId) -> KeyState {
        (0..=self.horizon as FrameId)
            .map_while(|back| frame_id.checked_sub(back))
            .find_map(|frame| self.remote_snapshot_at(frame))
            .unwrap_or(KeyState::NEUTRAL)
    }

    pub fn remote_len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Drops every remote snapshot and releases local keys.
    pub fn clear(&mut self) {
        self.local = KeyState::NEUTRAL;
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    fn slot_index(&self, frame_id: FrameId) -> usize {
        (frame_id % self.slots.len() as FrameId) as usize
    }
}
