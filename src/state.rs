//! Authoritative tally state tracking
//!
//! `TallyStateManager` owns the camera → tally mapping and the observer
//! registry that drives both server interfaces. All mutation goes through
//! `set_tally`, which stores the new state and invokes every observer before
//! releasing the lock, so observers always see a consistent table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, TallydError};

/// Tally state for a single camera channel.
///
/// `kind` is meaningful only while `is_on`; an "off" state carries an empty
/// kind. Compared structurally, so a no-op `set_tally` can be detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallyState {
    pub is_on: bool,
    pub kind: String,
}

impl TallyState {
    pub fn off() -> Self {
        Self::default()
    }

    pub fn on(kind: impl Into<String>) -> Self {
        Self {
            is_on: true,
            kind: kind.into(),
        }
    }

    /// Label used on the control protocol: `"off"` or the kind name.
    pub fn label(&self) -> &str {
        if self.is_on {
            &self.kind
        } else {
            "off"
        }
    }
}

/// Observer callback, invoked with `(camera, old_state, new_state)` after a
/// real state change. Observers are called with the manager lock held and
/// must not call back into the manager.
pub type Observer = Arc<dyn Fn(u32, &TallyState, &TallyState) + Send + Sync>;

struct Inner {
    /// Sparse per-camera state; an absent camera is implicitly off.
    tally: HashMap<u32, TallyState>,
    /// Effective snapshot length: the highest camera id ever set, or the
    /// explicit floor from `set_max_camera`, whichever is larger. Never
    /// shrinks within a process lifetime.
    max_camera: u32,
    observers: Vec<Observer>,
}

/// Authoritative mapping of camera channels to tally state.
pub struct TallyStateManager {
    /// Configured tally kinds in encoding order: the kind at index `i`
    /// carries numeric code `i + 1`. Code 0 is always "off".
    kinds: Vec<String>,
    inner: Mutex<Inner>,
}

impl TallyStateManager {
    /// Create a manager for an ordered set of 1-8 tally kinds.
    ///
    /// `"off"` is reserved and may not appear as a kind name.
    pub fn new(kinds: Vec<String>) -> Result<Self> {
        if kinds.is_empty() || kinds.len() > 8 {
            return Err(TallydError::Config {
                message: format!("expected 1-8 tally kinds, got {}", kinds.len()),
            });
        }
        for (i, kind) in kinds.iter().enumerate() {
            if kind == "off" {
                return Err(TallydError::Config {
                    message: "\"off\" is reserved and cannot be a tally kind".to_string(),
                });
            }
            if kinds[..i].contains(kind) {
                return Err(TallydError::Config {
                    message: format!("duplicate tally kind: {kind:?}"),
                });
            }
        }

        Ok(Self {
            kinds,
            inner: Mutex::new(Inner {
                tally: HashMap::new(),
                max_camera: 0,
                observers: Vec::new(),
            }),
        })
    }

    /// Configured tally kinds, in numeric encoding order.
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    /// Register an observer for tally changes.
    ///
    /// Observers fire in registration order. Registering the same `Arc`
    /// twice fails with `DuplicateObserver`.
    pub fn register_observer(&self, observer: Observer) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner
            .observers
            .iter()
            .any(|o| Arc::ptr_eq(o, &observer))
        {
            return Err(TallydError::DuplicateObserver);
        }
        inner.observers.push(observer);
        Ok(())
    }

    /// Set a camera's tally to `kind` (`"off"` or a configured kind).
    ///
    /// A valid call marks the camera as part of the snapshot even when the
    /// state does not change; observers fire only on a real transition.
    pub fn set_tally(&self, camera: u32, kind: &str) -> Result<()> {
        if camera < 1 {
            return Err(TallydError::InvalidCamera { camera });
        }
        let new_state = if kind == "off" {
            TallyState::off()
        } else if self.kinds.iter().any(|k| k == kind) {
            TallyState::on(kind)
        } else {
            return Err(TallydError::InvalidKind {
                kind: kind.to_string(),
            });
        };

        let mut inner = self.inner.lock();
        inner.max_camera = inner.max_camera.max(camera);

        let old_state = inner.tally.get(&camera).cloned().unwrap_or_default();
        if old_state == new_state {
            return Ok(());
        }

        tracing::debug!(
            camera,
            old = old_state.label(),
            new = new_state.label(),
            "tally changed"
        );
        inner.tally.insert(camera, new_state.clone());

        // Iterate a snapshot copy so an observer list mutation elsewhere can
        // never corrupt this iteration. The lock stays held: nothing may
        // interleave between the store above and the notifications.
        let observers = inner.observers.clone();
        for observer in &observers {
            observer(camera, &old_state, &new_state);
        }

        Ok(())
    }

    /// Current state of a camera, defaulting to off. Does not extend the
    /// snapshot.
    pub fn get_tally(&self, camera: u32) -> Result<TallyState> {
        if camera < 1 {
            return Err(TallydError::InvalidCamera { camera });
        }
        let inner = self.inner.lock();
        Ok(inner.tally.get(&camera).cloned().unwrap_or_default())
    }

    /// Raise the reported snapshot length to at least `camera`.
    ///
    /// A no-op when the snapshot already covers `camera`; never removes or
    /// alters any stored per-camera state.
    pub fn set_max_camera(&self, camera: u32) {
        let mut inner = self.inner.lock();
        inner.max_camera = inner.max_camera.max(camera);
    }

    fn numeric_code(&self, state: &TallyState) -> u8 {
        if !state.is_on {
            return 0;
        }
        // set_tally guarantees an "on" kind is configured.
        self.kinds
            .iter()
            .position(|k| k == &state.kind)
            .map(|i| (i + 1) as u8)
            .unwrap_or(0)
    }

    /// Numeric tally code for one camera: 0 when off, else the 1-based
    /// position of its kind in the configured order.
    pub fn numeric_tally(&self, camera: u32) -> Result<u8> {
        let state = self.get_tally(camera)?;
        Ok(self.numeric_code(&state))
    }

    /// Numeric codes for every camera from 1 to the effective snapshot
    /// length, in order. Empty when no camera has ever been set or floored.
    pub fn all_numeric_tally(&self) -> Vec<u8> {
        let inner = self.inner.lock();
        (1..=inner.max_camera)
            .map(|camera| {
                let state = inner.tally.get(&camera).cloned().unwrap_or_default();
                self.numeric_code(&state)
            })
            .collect()
    }
}
