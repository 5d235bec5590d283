//! JSON wire protocol shared with the match server.
//!
//! Every message travels as an envelope `{ "type": ..., "payload": ... }`. A `"game"`
//! envelope carries either a control payload (it has an `action` field) or a full
//! state snapshot. Anything outside the known set decodes to
//! [`Message::Unrecognized`] instead of failing, so callers can decide what an
//! out-of-protocol peer means for them.

use crate::vector::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

pub type PlayerId = String;
pub type FrameId = u64;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One of the two directions a paddle can be pushed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Where a player's paddle sits on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Left,
    Right,
    TopLeft,
    BottomLeft,
    TopRight,
    BottomRight,
}

impl Side {
    pub fn is_left(&self) -> bool {
        matches!(self, Side::Left | Side::TopLeft | Side::BottomLeft)
    }

    pub fn color_tag(&self) -> &'static str {
        match self {
            Side::Left => "blue",
            Side::Right => "red",
            Side::TopLeft => "green",
            Side::BottomLeft => "purple",
            Side::TopRight => "orange",
            Side::BottomRight => "cyan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: Direction,
    pub pressed: bool,
}

/// Key transitions observed during one simulation frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFrame {
    pub frame_id: FrameId,
    pub inputs: Vec<KeyInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMessage {
    pub user_id: PlayerId,
    pub inputs: Vec<InputFrame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleSnapshot {
    pub player_id: PlayerId,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_id: PlayerId,
    pub score: u32,
}

/// Authoritative snapshot of the whole board for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatePayload {
    pub frame_id: FrameId,
    pub ball: BallSnapshot,
    pub paddles: Vec<PaddleSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<ScoreEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPayload {
    pub action: ControlAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_sides: Option<HashMap<PlayerId, Side>>,
    /// Epoch milliseconds at which frame 0 begins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerAction {
    Join,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPayload {
    pub action: PlayerAction,
    pub player_id: PlayerId,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Input(InputMessage),
    GameState(GameStatePayload),
    Control(ControlPayload),
    Player(PlayerPayload),
    /// Type or action outside the protocol; `kind` names what was received.
    Unrecognized { kind: String },
}

/// `kind` reported for JSON that carries no string `type` field.
pub const UNTYPED: &str = "untyped";

#[derive(Debug, Serialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    payload: Value,
}

fn payload<T: for<'de> Deserialize<'de>>(
    kind: &'static str,
    value: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|source| ProtocolError::Payload { kind, source })
}

impl Message {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let mut value: Value = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;

        let Some(kind) = value.get("type").and_then(Value::as_str).map(str::to_string) else {
            return Ok(Message::Unrecognized {
                kind: UNTYPED.to_string(),
            });
        };
        let body = value
            .get_mut("payload")
            .map(Value::take)
            .unwrap_or(Value::Null);

        let action = body
            .get("action")
            .map(|a| a.as_str().unwrap_or_default().to_string());

        match (kind.as_str(), action.as_deref()) {
            ("input", _) => Ok(Message::Input(payload("input", body)?)),
            ("game", None) => Ok(Message::GameState(payload("game", body)?)),
            ("game", Some("start" | "stopped")) => Ok(Message::Control(payload("game", body)?)),
            ("player", Some("join" | "leave")) => Ok(Message::Player(payload("player", body)?)),
            (kind, Some(action)) => Ok(Message::Unrecognized {
                kind: format!("{}/{}", kind, action),
            }),
            (kind, None) => Ok(Message::Unrecognized {
                kind: kind.to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        let (kind, payload) = match self {
            Message::Input(p) => ("input", serde_json::to_value(p)?),
            Message::GameState(p) => ("game", serde_json::to_value(p)?),
            Message::Control(p) => ("game", serde_json::to_value(p)?),
            Message::Player(p) => ("player", serde_json::to_value(p)?),
            Message::Unrecognized { kind } => (kind.as_str(), Value::Null),
        };
        Ok(serde_json::to_string(&Envelope {
            kind: kind.to_string(),
            payload,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_input_message() {
        let text = r#"{"type":"input","payload":{"userId":"alice","inputs":[
            {"frameId":100,"inputs":[{"key":"up","pressed":true}]}]}}"#;

        match Message::from_json(text).unwrap() {
            Message::Input(input) => {
                assert_eq!(input.user_id, "alice");
                assert_eq!(input.inputs.len(), 1);
                assert_eq!(input.inputs[0].frame_id, 100);
                assert_eq!(
                    input.inputs[0].inputs,
                    vec![KeyInput {
                        key: Direction::Up,
                        pressed: true
                    }]
                );
            }
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[test]
    fn test_parse_game_state_without_optional_fields() {
        let text = json!({
            "type": "game",
            "payload": {
                "frameId": 42,
                "ball": {"position": {"x": 10.0, "y": 20.0}, "velocity": {"x": -5.0, "y": 1.5}, "radius": 6.0},
                "paddles": [{"playerId": "bob", "position": {"x": 20.0, "y": 260.0}, "width": 10.0, "height": 80.0}]
            }
        })
        .to_string();

        match Message::from_json(&text).unwrap() {
            Message::GameState(state) => {
                assert_eq!(state.frame_id, 42);
                assert_eq!(state.ball.velocity, Vec2::new(-5.0, 1.5));
                assert_eq!(state.paddles[0].player_id, "bob");
                assert!(state.scores.is_none());
                assert!(state.state.is_none());
            }
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[test]
    fn test_parse_start_control() {
        let text = json!({
            "type": "game",
            "payload": {
                "action": "start",
                "gameId": "g-1",
                "playerSides": {"alice": "left", "bob": "right"},
                "startTime": 1_700_000_000_000u64
            }
        })
        .to_string();

        match Message::from_json(&text).unwrap() {
            Message::Control(control) => {
                assert_eq!(control.action, ControlAction::Start);
                assert_eq!(control.start_time, Some(1_700_000_000_000));
                let sides = control.player_sides.unwrap();
                assert_eq!(sides.get("alice"), Some(&Side::Left));
                assert_eq!(sides.get("bob"), Some(&Side::Right));
            }
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[test]
    fn test_corner_sides_use_kebab_case() {
        let side: Side = serde_json::from_str(r#""bottom-right""#).unwrap();
        assert_eq!(side, Side::BottomRight);
        assert!(!side.is_left());
        assert!(Side::TopLeft.is_left());
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        let message = Message::from_json(r#"{"type":"chat","payload":{"text":"hi"}}"#).unwrap();
        assert_eq!(
            message,
            Message::Unrecognized {
                kind: "chat".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_game_action_is_unrecognized() {
        let message =
            Message::from_json(r#"{"type":"game","payload":{"action":"pause"}}"#).unwrap();
        assert_eq!(
            message,
            Message::Unrecognized {
                kind: "game/pause".to_string()
            }
        );
    }

    #[test]
    fn test_missing_type_is_unrecognized() {
        for text in [
            r#"{"payload":{"action":"pause"}}"#,
            r#"{"type":7,"payload":{}}"#,
            r#"[1,2,3]"#,
        ] {
            assert_eq!(
                Message::from_json(text).unwrap(),
                Message::Unrecognized {
                    kind: UNTYPED.to_string()
                }
            );
        }
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            Message::from_json("{not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            Message::from_json(r#"{"type":"input","payload":{"inputs":[]}}"#),
            Err(ProtocolError::Payload { kind: "input", .. })
        ));
    }

    #[test]
    fn test_outgoing_input_uses_wire_field_names() {
        let message = Message::Input(InputMessage {
            user_id: "alice".to_string(),
            inputs: vec![InputFrame {
                frame_id: 7,
                inputs: vec![KeyInput {
                    key: Direction::Down,
                    pressed: false,
                }],
            }],
        });

        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "input",
                "payload": {
                    "userId": "alice",
                    "inputs": [{"frameId": 7, "inputs": [{"key": "down", "pressed": false}]}]
                }
            })
        );
    }
}
