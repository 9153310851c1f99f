//! Tallyd server interfaces
//!
//! Two TCP servers fan tally changes out from the state manager, one for
//! each class of downstream consumer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        TALLYD DAEMON                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   ┌──────────────────────────────────────────────────────────┐   │
//! │   │             TallyStateManager (single mutex)             │   │
//! │   │                                                          │   │
//! │   │   camera ──► TallyState { is_on, kind }                  │   │
//! │   │   observers: [control change observer, indicator wake]   │   │
//! │   └───────────────┬──────────────────────┬───────────────────┘   │
//! │                   │ (camera, old, new)   │ wake                  │
//! │                   ▼                      ▼                       │
//! │   ControlInterface              ClientInterface                  │
//! │     JSON lines over TCP           binary frames over TCP         │
//! │     subscribe/set/get/quit        push on change, pull on any    │
//! │     per-subscriber delta queue    line; full snapshot each time  │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocols
//!
//! Control clients speak line-delimited JSON:
//!
//! ```json
//! // Client -> Server (one per line)
//! {"cmd": "subscribe"}
//! {"cmd": "set", "camera": 2, "kind": "live"}
//! {"cmd": "get", "camera": 2}
//! {"cmd": "quit"}
//!
//! // Server -> Client
//! {"result": "ok"}
//! {"change": {"camera": 2, "old": "off", "new": "live"}}
//! ```
//!
//! Indicator clients receive binary snapshot frames: `0x02`, one byte per
//! camera (`1 << (code - 1)`, or `0` when off), `0x0A`.

pub mod control;
pub mod indicator;
pub mod protocol;

pub use control::ControlInterface;
pub use indicator::ClientInterface;
pub use protocol::{snapshot_frame, ChangeNotification, CommandResponse, ControlCommand};
