//! User callbacks and their isolation.
//!
//! A callback that returns an error or panics never aborts the transition
//! that triggered it: the failure is logged and recorded as a
//! [`KeyboardError::Callback`] diagnostic.

use crate::error::{CallbackKind, KeyboardError};
use crate::keyboard::events::InputEvent;
use crate::services::ResolvedKey;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Why a callback fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventCause {
    /// Pointer on the key region
    Pointer,
    /// Matching physical keystroke
    Keystroke,
    /// Pointer released anywhere on the surface
    SurfaceRelease,
    /// Window focus lost
    FocusLost,
    /// The key was disabled while pressed
    Disabled,
    /// The active layout changed while the key was pressed
    LayoutChanged,
}

impl fmt::Display for KeyEventCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pointer => "pointer",
            Self::Keystroke => "keystroke",
            Self::SurfaceRelease => "surface-release",
            Self::FocusLost => "focus-lost",
            Self::Disabled => "disabled",
            Self::LayoutChanged => "layout-changed",
        };
        write!(f, "{name}")
    }
}

/// Payload passed to callbacks alongside the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Why the callback fired
    pub cause: KeyEventCause,
    /// Host event that triggered it, if any
    pub input: Option<InputEvent>,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

impl KeyEvent {
    /// Creates an event stamped now.
    #[must_use]
    pub fn new(cause: KeyEventCause, input: Option<InputEvent>) -> Self {
        Self {
            cause,
            input,
            timestamp: Utc::now(),
        }
    }
}

/// A user callback.
pub type KeyCallback = Box<dyn FnMut(&ResolvedKey, &KeyEvent) -> anyhow::Result<()>>;

/// The three user callbacks. Unset callbacks are no-ops.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) on_key_down: Option<KeyCallback>,
    pub(crate) on_key_up: Option<KeyCallback>,
    pub(crate) on_press: Option<KeyCallback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_key_down", &self.on_key_down.is_some())
            .field("on_key_up", &self.on_key_up.is_some())
            .field("on_press", &self.on_press.is_some())
            .finish()
    }
}

impl Callbacks {
    /// Runs one callback, converting an error or panic into a diagnostic.
    pub(crate) fn invoke(
        &mut self,
        kind: CallbackKind,
        key: &ResolvedKey,
        event: &KeyEvent,
    ) -> Option<KeyboardError> {
        let callback = match kind {
            CallbackKind::KeyDown => self.on_key_down.as_mut(),
            CallbackKind::KeyUp => self.on_key_up.as_mut(),
            CallbackKind::Press => self.on_press.as_mut(),
        }?;

        let message = match catch_unwind(AssertUnwindSafe(|| callback(key, event))) {
            Ok(Ok(())) => return None,
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let error = KeyboardError::Callback {
            callback: kind,
            key: key.id(),
            message,
        };
        tracing::error!(cause = %event.cause, "{error}");
        Some(error)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "callback panicked".to_string())
}
