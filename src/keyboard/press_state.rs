//! Press-state engine.
//!
//! Tracks, per key, whether it is disabled, highlighted or pressed, plus the
//! ordered set of pressed keys. Operations return the transition they made so
//! the caller can run callbacks after the state is committed.

use chrono::{DateTime, Utc};

/// What triggered a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTrigger {
    /// Pointer down on the key region
    Pointer,
    /// Matching physical keystroke
    Keystroke,
}

/// State of one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Activation is ignored
    pub disabled: bool,
    /// Emphasized by the renderer
    pub hilighted: bool,
    /// Activation time while pressed
    pub pressed: Option<DateTime<Utc>>,
}

impl KeyState {
    /// Returns true while the key is held.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }
}

/// A committed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Key went down
    Pressed {
        /// Key index
        index: usize,
        /// Trigger
        trigger: PressTrigger,
        /// Activation time
        at: DateTime<Utc>,
    },
    /// Key went up
    Released {
        /// Key index
        index: usize,
    },
}

impl Transition {
    /// Index of the key that changed.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Pressed { index, .. } | Self::Released { index } => *index,
        }
    }
}

/// Per-key press state for one rendered layout.
#[derive(Debug, Clone, Default)]
pub struct PressEngine {
    states: Vec<KeyState>,
    pressed: Vec<usize>,
}

impl PressEngine {
    /// Creates an engine for keys with the given `(disabled, hilighted)`
    /// flags, all released.
    pub fn new(flags: impl IntoIterator<Item = (bool, bool)>) -> Self {
        Self {
            states: flags
                .into_iter()
                .map(|(disabled, hilighted)| KeyState {
                    disabled,
                    hilighted,
                    pressed: None,
                })
                .collect(),
            pressed: Vec::new(),
        }
    }

    /// State of a key.
    #[must_use]
    pub fn state(&self, index: usize) -> Option<&KeyState> {
        self.states.get(index)
    }

    /// Number of keys tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no keys are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Pressed keys in activation order.
    #[must_use]
    pub fn pressed(&self) -> &[usize] {
        &self.pressed
    }

    /// Returns true if the key is held.
    #[must_use]
    pub fn is_pressed(&self, index: usize) -> bool {
        self.states.get(index).is_some_and(KeyState::is_pressed)
    }

    /// Presses a key. No-op when the key is unknown, disabled or already
    /// pressed.
    pub fn press(&mut self, index: usize, trigger: PressTrigger) -> Option<Transition> {
        self.press_at(index, trigger, Utc::now())
    }

    /// Presses a key with an explicit activation time.
    pub fn press_at(&mut self, index: usize, trigger: PressTrigger, at: DateTime<Utc>) -> Option<Transition> {
        let state = self.states.get_mut(index)?;
        if state.disabled || state.is_pressed() {
            tracing::trace!(index, disabled = state.disabled, "Press ignored");
            return None;
        }
        state.pressed = Some(at);
        self.pressed.push(index);
        Some(Transition::Pressed { index, trigger, at })
    }

    /// Releases a key. No-op when it is not pressed.
    pub fn release(&mut self, index: usize) -> Option<Transition> {
        let state = self.states.get_mut(index)?;
        state.pressed.take()?;
        self.pressed.retain(|&i| i != index);
        Some(Transition::Released { index })
    }

    /// Releases every pressed key in activation order.
    pub fn release_all(&mut self) -> Vec<Transition> {
        let pressed = std::mem::take(&mut self.pressed);
        pressed
            .into_iter()
            .filter_map(|index| {
                let state = self.states.get_mut(index)?;
                state.pressed.take().map(|_| Transition::Released { index })
            })
            .collect()
    }

    /// Clears the pressed set without reporting transitions.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.pressed = None;
        }
        self.pressed.clear();
    }

    /// Sets the disabled flag. Disabling a pressed key releases it.
    pub fn set_disabled(&mut self, index: usize, disabled: bool) -> Option<Transition> {
        let state = self.states.get_mut(index)?;
        state.disabled = disabled;
        if disabled {
            self.release(index)
        } else {
            None
        }
    }

    /// Sets the highlight flag.
    pub fn set_hilighted(&mut self, index: usize, hilighted: bool) {
        if let Some(state) = self.states.get_mut(index) {
            state.hilighted = hilighted;
        }
    }

    /// Restores a pressed state carried over from a previous render.
    pub fn restore(&mut self, index: usize, at: DateTime<Utc>) {
        if let Some(state) = self.states.get_mut(index) {
            if !state.disabled && !state.is_pressed() {
                state.pressed = Some(at);
                self.pressed.push(index);
            }
        }
    }
}
