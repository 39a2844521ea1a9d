//! Integration tests for the keyboard widget: construction, press state,
//! callback isolation and teardown.

mod fixtures;
use fixtures::*;

use okeyboard::error::kind_of;
use okeyboard::export::{TextSurface, TextSurfaceRegistry};
use okeyboard::keyboard::{EventKind, EventRegistry, EventScope, InputEvent, Keyboard};
use okeyboard::models::RawTable;

fn down(key: &str) -> InputEvent {
    InputEvent::PointerDown { key: key.into() }
}

fn keystroke(key: &str) -> InputEvent {
    InputEvent::KeyDown { key: key.into() }
}

fn validation_message(result: anyhow::Result<Keyboard<TextSurface, EventRegistry>>) -> String {
    let err = result.err().expect("construction should fail");
    let kind = kind_of(&err).expect("error should carry a keyboard error");
    assert!(kind.is_validation(), "expected validation error, got {kind}");
    kind.to_string()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_build_requires_container() {
    let result = Keyboard::<TextSurface, EventRegistry>::builder()
        .layout(raw_layout(PLAIN_LAYOUT))
        .build(EventRegistry::new());
    assert_eq!(validation_message(result), "Validation Error: container is required");
}

#[test]
fn test_build_rejects_invalid_surface() {
    let result = Keyboard::builder()
        .container(TextSurface::new(1))
        .layout(raw_layout(PLAIN_LAYOUT))
        .build(EventRegistry::new());
    assert_eq!(
        validation_message(result),
        "Validation Error: container is not a valid surface"
    );
}

#[test]
fn test_build_requires_layout() {
    let result = Keyboard::builder()
        .container(TextSurface::new(5))
        .build(EventRegistry::new());
    assert_eq!(
        validation_message(result),
        "Validation Error: at least one layout is required"
    );
}

#[test]
fn test_locate_surface_by_selector() {
    let mut registry = TextSurfaceRegistry::new().with_surface("#keyboard", TextSurface::new(5));

    let keyboard = Keyboard::builder()
        .locate(&mut registry, "#keyboard")
        .layout(raw_layout(PLAIN_LAYOUT))
        .build(EventRegistry::new())
        .unwrap();
    assert!(keyboard.surface().view().is_some());

    // Already handed out.
    let result = Keyboard::builder()
        .locate(&mut registry, "#keyboard")
        .layout(raw_layout(PLAIN_LAYOUT))
        .build(EventRegistry::new());
    assert_eq!(
        validation_message(result),
        "Validation Error: container '#keyboard' not found"
    );
}

#[test]
fn test_configuration_error_prevents_construction() {
    let result = Keyboard::builder()
        .container(TextSurface::new(5))
        .layout(raw_layout(
            r#"{"name":"broken","labels":[{"labelTable":"letter/xx"}],"keys":["a"]}"#,
        ))
        .build(EventRegistry::new());
    let err = result.err().unwrap();
    assert!(kind_of(&err).is_some_and(|k| k.is_configuration()));
    assert!(format!("{err:#}").contains("letter/xx"));
}

#[test]
fn test_widget_tables_are_shared() {
    let keyboard = Keyboard::builder()
        .container(TextSurface::new(5))
        .table(RawTable::new("letter", "en", [("a", "A"), ("b", "B")]))
        .layout(raw_layout(
            r#"{"name":"shared","labels":[{"labelTable":"letter/en"}],"keys":["a","b"]}"#,
        ))
        .build(EventRegistry::new())
        .unwrap();
    assert_eq!(keyboard.key("b").unwrap().labels, vec![vec!["B".to_string()]]);
}

#[test]
fn test_subscriptions_after_build() {
    let (keyboard, _log) = logging_keyboard(PLAIN_LAYOUT);
    let events = keyboard.events();

    assert_eq!(events.active_count(), 3 * 2 + 4);
    assert!(events.is_subscribed(&EventScope::KeyRegion("a".into()), EventKind::PointerDown));
    assert!(events.is_subscribed(&EventScope::KeyRegion("c".into()), EventKind::PointerUp));
    assert!(events.is_subscribed(&EventScope::Surface, EventKind::PointerUp));
    assert!(events.is_subscribed(&EventScope::Document, EventKind::KeyDown));
    assert!(events.is_subscribed(&EventScope::Document, EventKind::KeyUp));
    assert!(events.is_subscribed(&EventScope::Window, EventKind::FocusLost));
}

// ============================================================================
// Press state
// ============================================================================

#[test]
fn test_disabled_key_stays_released() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);

    assert!(!keyboard.handle_event(&down("c")));
    assert!(!keyboard.handle_event(&keystroke("c")));
    assert!(!keyboard.is_pressed("c"));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_repeated_press_is_noop() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);

    assert!(keyboard.handle_event(&keystroke("a")));
    assert!(!keyboard.handle_event(&keystroke("a")));
    assert!(!keyboard.handle_event(&down("a")));
    assert_eq!(keyboard.pressed_keys().len(), 1);
    assert_eq!(*log.borrow(), vec!["press a keystroke", "down a keystroke"]);
}

#[test]
fn test_focus_loss_releases_everything_once() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);

    keyboard.handle_event(&down("a"));
    keyboard.handle_event(&keystroke("b"));
    log.borrow_mut().clear();

    assert!(keyboard.handle_event(&InputEvent::FocusLost));
    assert!(!keyboard.handle_event(&InputEvent::FocusLost));
    assert!(keyboard.pressed_keys().is_empty());
    assert_eq!(*log.borrow(), vec!["up a focus-lost", "up b focus-lost"]);
}

#[test]
fn test_surface_pointer_up_releases_everything() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);

    keyboard.handle_event(&keystroke("a"));
    keyboard.handle_event(&down("b"));
    log.borrow_mut().clear();

    assert!(keyboard.handle_event(&InputEvent::PointerUp { key: None }));
    assert!(keyboard.pressed_keys().is_empty());
    assert_eq!(*log.borrow(), vec!["up a surface-release", "up b surface-release"]);
}

#[test]
fn test_pointer_up_on_key_fires_once() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);

    keyboard.handle_event(&down("a"));
    keyboard.handle_event(&keystroke("b"));
    log.borrow_mut().clear();

    keyboard.handle_event(&InputEvent::PointerUp { key: Some("a".into()) });
    assert_eq!(*log.borrow(), vec!["up a pointer", "up b surface-release"]);
}

#[test]
fn test_aliases_match_keystrokes_case_insensitively() {
    let (mut keyboard, log) = logging_keyboard(
        r#"{"name":"alias","keys":[{"key":["Enter","Return"]},"x"]}"#,
    );

    assert!(keyboard.handle_event(&keystroke("return")));
    assert!(keyboard.is_pressed("Enter,Return"));
    assert!(keyboard.handle_event(&InputEvent::KeyUp { key: "ENTER".into() }));
    assert_eq!(
        *log.borrow(),
        vec![
            "press Enter,Return keystroke",
            "down Enter,Return keystroke",
            "up Enter,Return keystroke"
        ]
    );
}

#[test]
fn test_unknown_keys_are_ignored() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);

    assert!(!keyboard.handle_event(&down("zz")));
    assert!(!keyboard.handle_event(&keystroke("zz")));
    assert!(!keyboard.enable_key("zz", false));
    assert!(!keyboard.highlight_key("zz", true));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_highlight_reaches_surface() {
    let (mut keyboard, _log) = logging_keyboard(PLAIN_LAYOUT);

    assert!(keyboard.highlight_key("b", true));
    assert!(keyboard.surface().key_state("b").unwrap().hilighted);
    keyboard.render().unwrap();
    assert!(keyboard.key("b").unwrap().hilighted);
    assert!(keyboard.surface().key_state("b").unwrap().hilighted);
}

// ============================================================================
// Callback isolation
// ============================================================================

#[test]
fn test_failing_callbacks_do_not_block_transitions() {
    let mut keyboard = Keyboard::builder()
        .container(TextSurface::new(5))
        .layout(raw_layout(PLAIN_LAYOUT))
        .on_key_down(|_, _| anyhow::bail!("down failed"))
        .on_key_up(|key, _| panic!("up panicked on {}", key.id()))
        .build(EventRegistry::new())
        .unwrap();

    assert!(keyboard.handle_event(&down("a")));
    assert!(keyboard.is_pressed("a"));
    assert!(keyboard.handle_event(&InputEvent::FocusLost));
    assert!(!keyboard.is_pressed("a"));

    let diagnostics = keyboard.take_diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.is_callback()));
    assert_eq!(
        diagnostics[0].to_string(),
        "[Key a] Callback Error in onKeyDown: down failed"
    );
    assert_eq!(
        diagnostics[1].to_string(),
        "[Key a] Callback Error in onKeyUp: up panicked on a"
    );
    assert!(keyboard.take_diagnostics().is_empty());
}

// ============================================================================
// Layout management and teardown
// ============================================================================

#[test]
fn test_add_layout_updates_active_layout() {
    let (mut keyboard, _log) = logging_keyboard(PLAIN_LAYOUT);
    keyboard.handle_event(&down("a"));

    keyboard
        .add_layout(raw_layout(r#"{"name":"plain","keys":["a","d"]}"#))
        .unwrap();
    assert_eq!(keyboard.resolved().keys.len(), 2);
    assert!(keyboard.is_pressed("a"));
    assert!(keyboard.key("d").is_some());
    assert_eq!(keyboard.events().active_count(), 2 * 2 + 4);
}

#[test]
fn test_add_layout_failure_keeps_state() {
    let (mut keyboard, _log) = logging_keyboard(PLAIN_LAYOUT);

    let err = keyboard
        .add_layout(raw_layout(
            r#"{"name":"plain","labels":[{"valueTable":"nope/nope"}]}"#,
        ))
        .unwrap_err();
    assert!(kind_of(&err).is_some_and(|k| k.is_configuration()));
    assert!(keyboard.layout().labels.is_empty());
    assert_eq!(keyboard.resolved().keys.len(), 3);
}

#[test]
fn test_destroy_releases_subscriptions_silently() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);
    keyboard.handle_event(&down("a"));
    log.borrow_mut().clear();

    keyboard.destroy();
    assert_eq!(keyboard.events().active_count(), 0);
    assert!(keyboard.surface().view().is_none());
    assert!(log.borrow().is_empty());

    keyboard.destroy();
    assert!(!keyboard.handle_event(&InputEvent::FocusLost));
    assert!(keyboard.render().is_err());
}

#[test]
fn test_key_flags_ignored_after_destroy() {
    let (mut keyboard, log) = logging_keyboard(PLAIN_LAYOUT);
    keyboard.handle_event(&down("a"));
    keyboard.destroy();
    log.borrow_mut().clear();

    assert!(!keyboard.enable_key("a", false));
    assert!(!keyboard.highlight_key("b", true));
    assert!(!keyboard.layout().keys[0].disabled);
    assert!(!keyboard.layout().keys[1].hilighted);
    assert!(keyboard.surface().view().is_none());
    assert!(log.borrow().is_empty());
}
