//! Wire protocol types for both server interfaces
//!
//! The control protocol is line-delimited JSON: one command per line, one
//! response per line. The indicator-client protocol is a binary snapshot
//! frame pushed on every change and on demand.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallydError};
use crate::state::TallyState;

/// Frame start byte for indicator snapshot frames.
pub const STX: u8 = 0x02;
/// Frame terminator for indicator snapshot frames.
pub const LF: u8 = 0x0A;

/// A control-client command.
///
/// Unknown commands and missing fields fail decoding and map to
/// `MalformedMessage`; there is no fall-through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum ControlCommand {
    /// Opt in to change notifications on this connection.
    Subscribe,
    /// Set a camera's tally.
    Set { camera: u32, kind: String },
    /// Query a camera's tally.
    Get { camera: u32 },
    /// Close the connection.
    Quit,
}

impl ControlCommand {
    /// Decode one command line.
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| TallydError::MalformedMessage {
            message: e.to_string(),
        })
    }
}

/// Per-command response line: `{"result": "ok"|"error"|"off"|<kind>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub result: String,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            result: "ok".to_string(),
        }
    }

    pub fn error() -> Self {
        Self {
            result: "error".to_string(),
        }
    }

    pub fn tally(state: &TallyState) -> Self {
        Self {
            result: state.label().to_string(),
        }
    }
}

/// Unsolicited change notification pushed to subscribed control clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub change: ChangeBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBody {
    pub camera: u32,
    pub old: String,
    pub new: String,
}

impl ChangeNotification {
    pub fn new(camera: u32, old: &TallyState, new: &TallyState) -> Self {
        Self {
            change: ChangeBody {
                camera,
                old: old.label().to_string(),
                new: new.label().to_string(),
            },
        }
    }
}

/// Encode a numeric tally snapshot as an indicator frame.
///
/// Layout: STX, one byte per camera in snapshot order, LF. A camera byte is
/// 0 when off, else `1 << (code - 1)`, so the kind at position 0 sets bit 0,
/// position 1 sets bit 1, and so on. The daemon only ever sets one bit per
/// byte; the bit packing lets clients OR simultaneous signals if they need
/// to.
pub fn snapshot_frame(codes: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(codes.len() + 2);
    frame.push(STX);
    frame.extend(codes.iter().map(|&code| {
        if code == 0 {
            0
        } else {
            1u8 << (code - 1)
        }
    }));
    frame.push(LF);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ControlCommand::parse(r#"{"cmd": "subscribe"}"#).unwrap(),
            ControlCommand::Subscribe
        );
        assert_eq!(
            ControlCommand::parse(r#"{"cmd": "set", "camera": 2, "kind": "live"}"#).unwrap(),
            ControlCommand::Set {
                camera: 2,
                kind: "live".to_string()
            }
        );
        assert_eq!(
            ControlCommand::parse(r#"{"cmd": "get", "camera": 7}"#).unwrap(),
            ControlCommand::Get { camera: 7 }
        );
        assert_eq!(
            ControlCommand::parse(r#"{"cmd": "quit"}"#).unwrap(),
            ControlCommand::Quit
        );
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        // Not JSON at all.
        assert!(matches!(
            ControlCommand::parse("hello"),
            Err(TallydError::MalformedMessage { .. })
        ));
        // Missing the cmd tag.
        assert!(ControlCommand::parse(r#"{"camera": 1}"#).is_err());
        // Unknown command.
        assert!(ControlCommand::parse(r#"{"cmd": "reboot"}"#).is_err());
        // Missing required field.
        assert!(ControlCommand::parse(r#"{"cmd": "set", "camera": 1}"#).is_err());
        // Negative camera ids never reach the state manager.
        assert!(ControlCommand::parse(r#"{"cmd": "get", "camera": -1}"#).is_err());
    }

    #[test]
    fn test_response_json_shape() {
        assert_eq!(
            serde_json::to_string(&CommandResponse::ok()).unwrap(),
            r#"{"result":"ok"}"#
        );
        assert_eq!(
            serde_json::to_string(&CommandResponse::error()).unwrap(),
            r#"{"result":"error"}"#
        );
        assert_eq!(
            serde_json::to_string(&CommandResponse::tally(&TallyState::on("live"))).unwrap(),
            r#"{"result":"live"}"#
        );
        assert_eq!(
            serde_json::to_string(&CommandResponse::tally(&TallyState::off())).unwrap(),
            r#"{"result":"off"}"#
        );
    }

    #[test]
    fn test_change_notification_json_shape() {
        let notification =
            ChangeNotification::new(3, &TallyState::off(), &TallyState::on("preview"));
        assert_eq!(
            serde_json::to_string(&notification).unwrap(),
            r#"{"change":{"camera":3,"old":"off","new":"preview"}}"#
        );
    }

    #[test]
    fn test_snapshot_frame_encoding() {
        // The reference scenario: cameras 1..=10, preview on 1, live on 8.
        let frame = snapshot_frame(&[2, 0, 0, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(
            frame,
            vec![0x02, 0x02, 0, 0, 0, 0, 0, 0, 0x01, 0, 0, 0x0A]
        );
    }

    #[test]
    fn test_snapshot_frame_bit_positions() {
        // Code n sets bit n-1, up to the 8th configured kind.
        let frame = snapshot_frame(&[1, 2, 3, 8]);
        assert_eq!(frame, vec![STX, 0x01, 0x02, 0x04, 0x80, LF]);
    }

    #[test]
    fn test_empty_snapshot_frame() {
        assert_eq!(snapshot_frame(&[]), vec![STX, LF]);
    }
}
