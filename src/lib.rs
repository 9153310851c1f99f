//! Tallyd: camera tally distribution daemon
//!
//! An authoritative process that tracks, per camera channel, whether it is
//! live, in preview, or off, and pushes changes to two classes of TCP
//! consumers: production control software (line-delimited JSON) and tally
//! light hardware (compact binary snapshot frames).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tallyd::{ClientInterface, ControlInterface, TallyStateManager};
//!
//! let manager = Arc::new(TallyStateManager::new(vec![
//!     "live".to_string(),
//!     "preview".to_string(),
//! ])?);
//!
//! let control = ControlInterface::new(Arc::clone(&manager))?;
//! let indicator = ClientInterface::new(Arc::clone(&manager))?;
//!
//! manager.set_tally(1, "live")?;
//! assert_eq!(manager.all_numeric_tally(), vec![1]);
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use config::TallydConfig;
pub use error::{Result, TallydError};
pub use server::{ClientInterface, ControlInterface};
pub use state::{Observer, TallyState, TallyStateManager};
