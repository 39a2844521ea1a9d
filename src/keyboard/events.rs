//! Host input events and the subscription interface.
//!
//! The widget never reaches for global event sources. It registers the
//! subscriptions it needs with an injected [`EventSource`] and is then fed
//! [`InputEvent`]s by the host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An input event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    /// Pointer pressed on a key region
    PointerDown {
        /// Region identifier of the key
        key: String,
    },
    /// Pointer released; `key` is `None` when released outside any key
    PointerUp {
        /// Region identifier of the key under the pointer
        key: Option<String>,
    },
    /// Physical keystroke down
    KeyDown {
        /// Keystroke identifier as reported by the host
        key: String,
    },
    /// Physical keystroke up
    KeyUp {
        /// Keystroke identifier as reported by the host
        key: String,
    },
    /// The window lost focus
    FocusLost,
}

impl InputEvent {
    /// Kind of the event, used to check subscriptions.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PointerDown { .. } => EventKind::PointerDown,
            Self::PointerUp { .. } => EventKind::PointerUp,
            Self::KeyDown { .. } => EventKind::KeyDown,
            Self::KeyUp { .. } => EventKind::KeyUp,
            Self::FocusLost => EventKind::FocusLost,
        }
    }
}

/// Kind of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Pointer down
    PointerDown,
    /// Pointer up
    PointerUp,
    /// Keystroke down
    KeyDown,
    /// Keystroke up
    KeyUp,
    /// Focus lost
    FocusLost,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PointerDown => "pointerdown",
            Self::PointerUp => "pointerup",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::FocusLost => "blur",
        };
        write!(f, "{name}")
    }
}

/// Where a subscription listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventScope {
    /// A single key region, by region identifier
    KeyRegion(String),
    /// The whole keyboard surface
    Surface,
    /// The host document (keystrokes)
    Document,
    /// The host window (focus)
    Window,
}

impl fmt::Display for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyRegion(id) => write!(f, "key '{id}'"),
            Self::Surface => write!(f, "surface"),
            Self::Document => write!(f, "document"),
            Self::Window => write!(f, "window"),
        }
    }
}

/// Handle returned by [`EventSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Host-side registry of event subscriptions.
pub trait EventSource {
    /// Registers interest in `kind` events on `scope`.
    fn subscribe(&mut self, scope: EventScope, kind: EventKind) -> SubscriptionId;

    /// Removes a subscription. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// A subscription held by an [`EventRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Handle
    pub id: SubscriptionId,
    /// Scope
    pub scope: EventScope,
    /// Event kind
    pub kind: EventKind,
}

/// In-memory [`EventSource`] for headless hosts and tests.
#[derive(Debug, Default)]
pub struct EventRegistry {
    next_id: u64,
    active: Vec<Subscription>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Returns true if some live subscription matches `scope` and `kind`.
    #[must_use]
    pub fn is_subscribed(&self, scope: &EventScope, kind: EventKind) -> bool {
        self.active.iter().any(|s| &s.scope == scope && s.kind == kind)
    }

    /// Live subscriptions in registration order.
    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.active
    }
}

impl EventSource for EventRegistry {
    fn subscribe(&mut self, scope: EventScope, kind: EventKind) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.active.push(Subscription { id, scope, kind });
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.active.retain(|s| s.id != id);
    }
}
