//! On-screen keyboard widget.
//!
//! [`Keyboard`] owns the registered layouts, renders the active one onto an
//! injected [`Surface`] and reconciles pointer and keystroke input into
//! per-key press state, calling user callbacks on every transition.
//!
//! ```no_run
//! use okeyboard::keyboard::{EventRegistry, Keyboard};
//! use okeyboard::export::TextSurface;
//! use okeyboard::models::RawLayout;
//!
//! # fn main() -> anyhow::Result<()> {
//! let layout = RawLayout::from_json(r#"{"name":"en","keys":[["q","w","e"]]}"#)?;
//! let mut keyboard = Keyboard::builder()
//!     .container(TextSurface::new(9))
//!     .layout(layout)
//!     .on_key_down(|key, _| {
//!         println!("down {}", key.id());
//!         Ok(())
//!     })
//!     .build(EventRegistry::new())?;
//! keyboard.destroy();
//! # Ok(())
//! # }
//! ```

pub mod callbacks;
pub mod events;
pub mod press_state;
pub mod surface;

pub use callbacks::{KeyCallback, KeyEvent, KeyEventCause};
pub use events::{EventKind, EventRegistry, EventScope, EventSource, InputEvent, SubscriptionId};
pub use press_state::{KeyState, PressEngine, PressTrigger, Transition};
pub use surface::{KeyView, KeyVisualState, KeyboardView, LabelView, Surface, SurfaceLocator};

use crate::error::{CallbackKind, KeyboardError};
use crate::models::{Layout, RawLayout, RawTable, Table};
use crate::services::{resolve_layout, ResolvedKey, ResolvedLayout};
use anyhow::{Context, Result};
use callbacks::Callbacks;
use std::marker::PhantomData;

/// A subscription the widget holds on its event source.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Held {
    scope: EventScope,
    kind: EventKind,
    id: SubscriptionId,
}

/// Builder for [`Keyboard`].
pub struct KeyboardBuilder<S: Surface, E: EventSource> {
    container: Option<S>,
    container_error: Option<String>,
    layouts: Vec<RawLayout>,
    tables: Vec<RawTable>,
    callbacks: Callbacks,
    _events: PhantomData<fn() -> E>,
}

impl<S: Surface, E: EventSource> std::fmt::Debug for KeyboardBuilder<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardBuilder")
            .field("container", &self.container.is_some())
            .field("layouts", &self.layouts.len())
            .field("tables", &self.tables.len())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

impl<S: Surface, E: EventSource> Default for KeyboardBuilder<S, E> {
    fn default() -> Self {
        Self {
            container: None,
            container_error: None,
            layouts: Vec::new(),
            tables: Vec::new(),
            callbacks: Callbacks::default(),
            _events: PhantomData,
        }
    }
}

impl<S: Surface, E: EventSource> KeyboardBuilder<S, E> {
    /// Sets the rendering surface.
    #[must_use]
    pub fn container(mut self, surface: S) -> Self {
        self.container = Some(surface);
        self.container_error = None;
        self
    }

    /// Looks up the rendering surface by selector.
    #[must_use]
    pub fn locate<L>(mut self, locator: &mut L, selector: &str) -> Self
    where
        L: SurfaceLocator<Surface = S>,
    {
        match locator.locate(selector) {
            Some(surface) => self.container(surface),
            None => {
                self.container = None;
                self.container_error = Some(format!("container '{selector}' not found"));
                self
            }
        }
    }

    /// Registers a layout. A layout with an already registered name is
    /// merged into it. The last layout given is active.
    #[must_use]
    pub fn layout(mut self, layout: RawLayout) -> Self {
        self.layouts.push(layout);
        self
    }

    /// Adds a widget-level table shared by every layout.
    #[must_use]
    pub fn table(mut self, table: RawTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Adds several widget-level tables.
    #[must_use]
    pub fn tables(mut self, tables: impl IntoIterator<Item = RawTable>) -> Self {
        self.tables.extend(tables);
        self
    }

    /// Called when a key goes down.
    #[must_use]
    pub fn on_key_down<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ResolvedKey, &KeyEvent) -> Result<()> + 'static,
    {
        self.callbacks.on_key_down = Some(Box::new(callback));
        self
    }

    /// Called when a key goes up.
    #[must_use]
    pub fn on_key_up<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ResolvedKey, &KeyEvent) -> Result<()> + 'static,
    {
        self.callbacks.on_key_up = Some(Box::new(callback));
        self
    }

    /// Called before `on_key_down` when a physical keystroke presses a key.
    #[must_use]
    pub fn on_press<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ResolvedKey, &KeyEvent) -> Result<()> + 'static,
    {
        self.callbacks.on_press = Some(Box::new(callback));
        self
    }

    /// Validates the options, builds the layouts, renders and subscribes.
    ///
    /// # Errors
    ///
    /// - validation error if the container is missing or invalid, no layout
    ///   was given, or a layout or table is malformed
    /// - configuration error if a label slot references an unknown table
    pub fn build(self, events: E) -> Result<Keyboard<S, E>> {
        if let Some(message) = self.container_error {
            return Err(KeyboardError::validation(message).into());
        }
        let surface = self
            .container
            .ok_or_else(|| KeyboardError::validation("container is required"))?;
        if !surface.is_valid() {
            return Err(KeyboardError::validation("container is not a valid surface").into());
        }

        let shared_tables = self
            .tables
            .into_iter()
            .map(Table::from_raw)
            .collect::<Result<Vec<_>>>()
            .context("Failed to load widget tables")?;

        let mut layouts = Vec::new();
        let mut active = None;
        for raw in self.layouts {
            active = Some(register_layout(&mut layouts, raw, &shared_tables)?);
        }
        let active = active.ok_or_else(|| KeyboardError::validation("at least one layout is required"))?;

        let resolved = resolve_layout(&layouts[active])?;

        let mut keyboard = Keyboard {
            surface,
            events,
            layouts,
            active,
            shared_tables,
            callbacks: self.callbacks,
            resolved: ResolvedLayout::default(),
            engine: PressEngine::default(),
            key_subscriptions: Vec::new(),
            global_subscriptions: Vec::new(),
            diagnostics: Vec::new(),
            destroyed: false,
        };
        keyboard.apply_resolved(resolved);
        keyboard.subscribe_global();

        tracing::debug!(
            layout = %keyboard.resolved.name,
            layouts = keyboard.layouts.len(),
            keys = keyboard.resolved.keys.len(),
            "Keyboard built"
        );
        Ok(keyboard)
    }
}

/// Merges `raw` into the layout of the same name or appends a new one.
/// Returns the index of the affected layout.
fn register_layout(layouts: &mut Vec<Layout>, raw: RawLayout, shared: &[Table]) -> Result<usize> {
    let name = raw
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| KeyboardError::validation("layout.name is required"))?;

    if let Some(index) = layouts.iter().position(|l| l.name == name) {
        let layout = &mut layouts[index];
        layout
            .apply(raw)
            .with_context(|| format!("Failed to update layout '{name}'"))?;
        layout.add_shared_tables(shared);
        return Ok(index);
    }

    let mut layout = Layout::from_raw(raw).with_context(|| format!("Failed to build layout '{name}'"))?;
    layout.add_shared_tables(shared);
    layouts.push(layout);
    Ok(layouts.len() - 1)
}

/// The keyboard widget.
pub struct Keyboard<S: Surface, E: EventSource> {
    surface: S,
    events: E,
    layouts: Vec<Layout>,
    active: usize,
    shared_tables: Vec<Table>,
    callbacks: Callbacks,
    resolved: ResolvedLayout,
    engine: PressEngine,
    key_subscriptions: Vec<Held>,
    global_subscriptions: Vec<Held>,
    diagnostics: Vec<KeyboardError>,
    destroyed: bool,
}

impl<S: Surface, E: EventSource> std::fmt::Debug for Keyboard<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyboard")
            .field("layout", &self.resolved.name)
            .field("layouts", &self.layouts.len())
            .field("pressed", &self.engine.pressed())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl<S: Surface, E: EventSource> Keyboard<S, E> {
    /// Starts building a keyboard.
    #[must_use]
    pub fn builder() -> KeyboardBuilder<S, E> {
        KeyboardBuilder::default()
    }

    /// Recomputes labels and placement and redraws the surface.
    ///
    /// Pressed keys that are still present and enabled stay pressed.
    ///
    /// # Errors
    ///
    /// Fails if the widget was destroyed or the active layout no longer
    /// resolves; the current rendering is kept in that case.
    pub fn render(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(KeyboardError::validation("keyboard has been destroyed").into());
        }
        let resolved = resolve_layout(self.layout())?;
        self.apply_resolved(resolved);
        Ok(())
    }

    /// Unsubscribes everything, drops pressed state without callbacks and
    /// clears the surface. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for held in self.key_subscriptions.drain(..).chain(self.global_subscriptions.drain(..)) {
            self.events.unsubscribe(held.id);
        }
        self.engine.reset();
        self.surface.clear();
        self.destroyed = true;
        tracing::debug!(layout = %self.resolved.name, "Keyboard destroyed");
    }

    /// Feeds one host event. Events without a matching subscription are
    /// ignored. Returns true if any key changed state.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        if self.destroyed {
            return false;
        }

        match event {
            InputEvent::PointerDown { key } => {
                if !self.holds(&EventScope::KeyRegion(key.clone()), EventKind::PointerDown) {
                    return false;
                }
                let Some(index) = self.key_index(key) else {
                    return false;
                };
                self.press(index, PressTrigger::Pointer, event)
            }
            InputEvent::PointerUp { key } => {
                let mut changed = false;
                if let Some(key) = key {
                    if self.holds(&EventScope::KeyRegion(key.clone()), EventKind::PointerUp) {
                        if let Some(index) = self.key_index(key) {
                            changed |= self.release(index, KeyEventCause::Pointer, Some(event));
                        }
                    }
                }
                if self.holds(&EventScope::Surface, EventKind::PointerUp) {
                    changed |= self.release_all(KeyEventCause::SurfaceRelease, Some(event));
                }
                changed
            }
            InputEvent::KeyDown { key } => {
                if !self.holds(&EventScope::Document, EventKind::KeyDown) {
                    return false;
                }
                let Some(index) = self.keystroke_index(key) else {
                    return false;
                };
                self.press(index, PressTrigger::Keystroke, event)
            }
            InputEvent::KeyUp { key } => {
                if !self.holds(&EventScope::Document, EventKind::KeyUp) {
                    return false;
                }
                let Some(index) = self.keystroke_index(key) else {
                    return false;
                };
                self.release(index, KeyEventCause::Keystroke, Some(event))
            }
            InputEvent::FocusLost => {
                if !self.holds(&EventScope::Window, EventKind::FocusLost) {
                    return false;
                }
                self.release_all(KeyEventCause::FocusLost, Some(event))
            }
        }
    }

    /// Enables or disables a key. Disabling a pressed key releases it.
    /// Returns false if no key has this identifier or the keyboard has been
    /// destroyed.
    pub fn enable_key(&mut self, id: &str, enable: bool) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(index) = self.key_index(id) else {
            tracing::warn!(key = id, "enable_key: unknown key");
            return false;
        };
        self.layouts[self.active].keys[index].disabled = !enable;
        self.resolved.keys[index].disabled = !enable;

        let released = self.engine.set_disabled(index, !enable);
        self.refresh_key(index);
        if released.is_some() {
            self.fire(CallbackKind::KeyUp, index, KeyEventCause::Disabled, None);
        }
        true
    }

    /// Turns a key's highlight on or off. Returns false if no key has this
    /// identifier or the keyboard has been destroyed.
    pub fn highlight_key(&mut self, id: &str, on: bool) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(index) = self.key_index(id) else {
            tracing::warn!(key = id, "highlight_key: unknown key");
            return false;
        };
        self.layouts[self.active].keys[index].hilighted = on;
        self.resolved.keys[index].hilighted = on;
        self.engine.set_hilighted(index, on);
        self.refresh_key(index);
        true
    }

    /// Switches the active layout, releasing pressed keys first.
    ///
    /// # Errors
    ///
    /// Fails with a validation error if no layout has this name, or with a
    /// configuration error if it does not resolve. The active layout is
    /// unchanged on error.
    pub fn use_layout(&mut self, name: &str) -> Result<()> {
        if self.destroyed {
            return Err(KeyboardError::validation("keyboard has been destroyed").into());
        }
        let index = self
            .layouts
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| KeyboardError::validation(format!("layout '{name}' not found")))?;
        let resolved = resolve_layout(&self.layouts[index])?;

        self.release_all(KeyEventCause::LayoutChanged, None);
        self.active = index;
        self.apply_resolved(resolved);
        tracing::debug!(layout = name, "Switched layout");
        Ok(())
    }

    /// Registers a layout, or merges it into the registered layout of the
    /// same name. Updating the active layout re-renders it.
    ///
    /// # Errors
    ///
    /// Fails if the layout is malformed or, when it is active, does not
    /// resolve. Registered layouts are unchanged on error.
    pub fn add_layout(&mut self, raw: RawLayout) -> Result<()> {
        let mut layouts = self.layouts.clone();
        let index = register_layout(&mut layouts, raw, &self.shared_tables)?;

        if index == self.active && !self.destroyed {
            let resolved = resolve_layout(&layouts[index])?;
            self.layouts = layouts;
            self.apply_resolved(resolved);
        } else {
            self.layouts = layouts;
        }
        Ok(())
    }

    /// The active layout.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layouts[self.active]
    }

    /// All registered layouts in registration order.
    #[must_use]
    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// The active layout as last rendered.
    #[must_use]
    pub fn resolved(&self) -> &ResolvedLayout {
        &self.resolved
    }

    /// A rendered key by region identifier.
    #[must_use]
    pub fn key(&self, id: &str) -> Option<&ResolvedKey> {
        self.resolved.key(id)
    }

    /// Press state of a rendered key.
    #[must_use]
    pub fn key_state(&self, id: &str) -> Option<KeyState> {
        self.key_index(id).and_then(|i| self.engine.state(i)).copied()
    }

    /// Pressed keys in activation order.
    #[must_use]
    pub fn pressed_keys(&self) -> Vec<&ResolvedKey> {
        self.engine
            .pressed()
            .iter()
            .map(|&i| &self.resolved.keys[i])
            .collect()
    }

    /// Returns true if the key is pressed.
    #[must_use]
    pub fn is_pressed(&self, id: &str) -> bool {
        self.key_index(id).is_some_and(|i| self.engine.is_pressed(i))
    }

    /// The view currently mounted on the surface.
    #[must_use]
    pub fn view(&self) -> KeyboardView {
        KeyboardView::build(&self.resolved, |i| self.engine.is_pressed(i))
    }

    /// Returns and clears the callback failures recorded so far.
    pub fn take_diagnostics(&mut self) -> Vec<KeyboardError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// The rendering surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The event source.
    #[must_use]
    pub fn events(&self) -> &E {
        &self.events
    }

    /// Returns true once [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn key_index(&self, id: &str) -> Option<usize> {
        self.resolved.key(id).map(|k| k.index)
    }

    fn keystroke_index(&self, keystroke: &str) -> Option<usize> {
        self.resolved.key_for_keystroke(keystroke).map(|k| k.index)
    }

    fn holds(&self, scope: &EventScope, kind: EventKind) -> bool {
        self.key_subscriptions
            .iter()
            .chain(&self.global_subscriptions)
            .any(|h| &h.scope == scope && h.kind == kind)
    }

    /// Installs a freshly resolved layout: carries pressed state over by
    /// identifier, remounts the surface and replaces key subscriptions.
    fn apply_resolved(&mut self, resolved: ResolvedLayout) {
        let carried: Vec<(String, chrono::DateTime<chrono::Utc>)> = self
            .engine
            .pressed()
            .iter()
            .filter_map(|&i| {
                let at = self.engine.state(i)?.pressed?;
                Some((self.resolved.keys.get(i)?.id(), at))
            })
            .collect();

        let mut engine = PressEngine::new(resolved.keys.iter().map(|k| (k.disabled, k.hilighted)));
        for (id, at) in carried {
            if let Some(key) = resolved.key(&id) {
                engine.restore(key.index, at);
            }
        }
        self.engine = engine;
        self.resolved = resolved;

        let view = self.view();
        self.surface.mount(&view);

        for held in self.key_subscriptions.drain(..) {
            self.events.unsubscribe(held.id);
        }
        for key in &self.resolved.keys {
            for kind in [EventKind::PointerDown, EventKind::PointerUp] {
                let scope = EventScope::KeyRegion(key.id());
                let id = self.events.subscribe(scope.clone(), kind);
                self.key_subscriptions.push(Held { scope, kind, id });
            }
        }

        tracing::debug!(
            layout = %self.resolved.name,
            keys = self.resolved.keys.len(),
            pressed = self.engine.pressed().len(),
            "Rendered keyboard"
        );
    }

    fn subscribe_global(&mut self) {
        for (scope, kind) in [
            (EventScope::Surface, EventKind::PointerUp),
            (EventScope::Document, EventKind::KeyDown),
            (EventScope::Document, EventKind::KeyUp),
            (EventScope::Window, EventKind::FocusLost),
        ] {
            let id = self.events.subscribe(scope.clone(), kind);
            self.global_subscriptions.push(Held { scope, kind, id });
        }
    }

    fn press(&mut self, index: usize, trigger: PressTrigger, input: &InputEvent) -> bool {
        if self.engine.press(index, trigger).is_none() {
            return false;
        }
        self.refresh_key(index);
        let id = self.resolved.keys[index].id();
        self.surface.focus_key(&id);
        tracing::debug!(key = %id, ?trigger, "Key pressed");

        match trigger {
            PressTrigger::Pointer => {
                self.fire(CallbackKind::KeyDown, index, KeyEventCause::Pointer, Some(input));
            }
            PressTrigger::Keystroke => {
                self.fire(CallbackKind::Press, index, KeyEventCause::Keystroke, Some(input));
                self.fire(CallbackKind::KeyDown, index, KeyEventCause::Keystroke, Some(input));
            }
        }
        true
    }

    fn release(&mut self, index: usize, cause: KeyEventCause, input: Option<&InputEvent>) -> bool {
        if self.engine.release(index).is_none() {
            return false;
        }
        self.refresh_key(index);
        tracing::debug!(key = %self.resolved.keys[index].id(), %cause, "Key released");
        self.fire(CallbackKind::KeyUp, index, cause, input);
        true
    }

    fn release_all(&mut self, cause: KeyEventCause, input: Option<&InputEvent>) -> bool {
        let released = self.engine.release_all();
        for transition in &released {
            self.refresh_key(transition.index());
        }
        for transition in &released {
            self.fire(CallbackKind::KeyUp, transition.index(), cause, input);
        }
        if !released.is_empty() {
            tracing::debug!(count = released.len(), %cause, "Released all keys");
        }
        !released.is_empty()
    }

    fn refresh_key(&mut self, index: usize) {
        if let Some(state) = self.engine.state(index) {
            let visual = KeyVisualState {
                disabled: state.disabled,
                hilighted: state.hilighted,
                pressed: state.is_pressed(),
            };
            self.surface.update_key(&self.resolved.keys[index].id(), visual);
        }
    }

    fn fire(&mut self, kind: CallbackKind, index: usize, cause: KeyEventCause, input: Option<&InputEvent>) {
        let event = KeyEvent::new(cause, input.cloned());
        let key = &self.resolved.keys[index];
        if let Some(err) = self.callbacks.invoke(kind, key, &event) {
            self.diagnostics.push(err);
        }
    }
}

impl<S: Surface, E: EventSource> Drop for Keyboard<S, E> {
    fn drop(&mut self) {
        self.destroy();
    }
}
