//! Error kinds raised by the keyboard core.
//!
//! Fallible operations return [`anyhow::Result`]; the concrete kind can be
//! recovered with `err.downcast_ref::<KeyboardError>()`.

use std::fmt;

/// The user callback a [`KeyboardError::Callback`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    /// `onKeyDown`
    KeyDown,
    /// `onKeyUp`
    KeyUp,
    /// `onPress` (keystroke path only)
    Press,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyDown => write!(f, "onKeyDown"),
            Self::KeyUp => write!(f, "onKeyUp"),
            Self::Press => write!(f, "onPress"),
        }
    }
}

/// Errors produced while building, resolving or driving a keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardError {
    /// A required field is missing or malformed (container, layout name,
    /// table type/name, row key, key identifier).
    Validation {
        /// Human-readable description
        message: String,
    },
    /// A label slot references a table that is not in the layout's store.
    Configuration {
        /// Declaration index of the offending label slot
        slot: usize,
        /// Field holding the reference (`valueTable`, `labelTable[1]`, ...)
        field: String,
        /// The reference as written
        reference: String,
    },
    /// A user callback returned an error or panicked.
    Callback {
        /// Which callback failed
        callback: CallbackKind,
        /// Identifier of the key being processed
        key: String,
        /// Error or panic message
        message: String,
    },
}

impl KeyboardError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a configuration error for an unresolved table reference.
    pub fn configuration(
        slot: usize,
        field: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            slot,
            field: field.into(),
            reference: reference.into(),
        }
    }

    /// Returns true for [`KeyboardError::Validation`].
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true for [`KeyboardError::Configuration`].
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true for [`KeyboardError::Callback`].
    #[must_use]
    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}

impl fmt::Display for KeyboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message } => write!(f, "Validation Error: {message}"),
            Self::Configuration {
                slot,
                field,
                reference,
            } => write!(
                f,
                "[Label {slot}] Configuration Error: {field} '{reference}' not found"
            ),
            Self::Callback {
                callback,
                key,
                message,
            } => write!(f, "[Key {key}] Callback Error in {callback}: {message}"),
        }
    }
}

impl std::error::Error for KeyboardError {}

/// Extracts the [`KeyboardError`] behind an `anyhow` error, if any.
#[must_use]
pub fn kind_of(err: &anyhow::Error) -> Option<&KeyboardError> {
    err.chain().find_map(|cause| cause.downcast_ref::<KeyboardError>())
}
