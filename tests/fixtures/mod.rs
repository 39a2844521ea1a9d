//! Shared test fixtures for integration and CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use okeyboard::export::TextSurface;
use okeyboard::keyboard::{EventRegistry, Keyboard, KeyboardBuilder};
use okeyboard::models::RawLayout;
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Two keys, one upper-cased slot bound to a table that only knows `a`.
pub const LETTER_LAYOUT: &str = r#"{
    "name": "letters",
    "labels": [{"labelTable": "letter/en", "case": "upper"}],
    "keys": ["a", "b"],
    "tables": [{"type": "letter", "name": "en", "rows": [{"key": "a", "value": "A"}]}]
}"#;

/// Morse layout: `itu` provides codes, `uk-legal` is a same-type variant.
pub const MORSE_LAYOUT: &str = r#"{
    "name": "morse",
    "title": "Morse",
    "labels": [
        {"valueTable": "morse/itu"},
        {"labelTable": "morse/uk-legal"},
        {"labelTable": "letter/en", "case": "upper"}
    ],
    "keys": [["a", "e"], ["t"]],
    "tables": [
        {"type": "morse", "name": "itu", "rows": [
            {"key": "a", "value": ".-"},
            {"key": "e", "value": "."},
            {"key": "t", "value": "-"}
        ]},
        {"type": "morse", "name": "uk-legal", "rows": [
            {"key": "a", "value": ".-.."},
            {"key": "e", "value": "."}
        ]},
        {"type": "letter", "name": "en", "rows": ["a", "e", "t"]}
    ]
}"#;

/// Three plain keys in two rows; `c` is disabled.
pub const PLAIN_LAYOUT: &str = r#"{"name":"plain","keys":[["a","b"],[{"key":"c","disabled":true}]]}"#;

/// Parses a JSON layout, panicking on error.
pub fn raw_layout(json: &str) -> RawLayout {
    RawLayout::from_json(json).expect("fixture layout should parse")
}

/// Callback log shared with the widget.
pub type Log = Rc<RefCell<Vec<String>>>;

/// A builder on a 5-wide text surface whose callbacks append
/// `"<callback> <key> <cause>"` to the returned log.
pub fn logging_builder() -> (KeyboardBuilder<TextSurface, EventRegistry>, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let (down, up, press) = (log.clone(), log.clone(), log.clone());
    let builder = Keyboard::builder()
        .container(TextSurface::new(5))
        .on_key_down(move |key, event| {
            down.borrow_mut().push(format!("down {} {}", key.id(), event.cause));
            Ok(())
        })
        .on_key_up(move |key, event| {
            up.borrow_mut().push(format!("up {} {}", key.id(), event.cause));
            Ok(())
        })
        .on_press(move |key, event| {
            press.borrow_mut().push(format!("press {} {}", key.id(), event.cause));
            Ok(())
        });
    (builder, log)
}

/// Builds a logging keyboard for one layout.
pub fn logging_keyboard(json: &str) -> (Keyboard<TextSurface, EventRegistry>, Log) {
    let (builder, log) = logging_builder();
    let keyboard = builder
        .layout(raw_layout(json))
        .build(EventRegistry::new())
        .expect("fixture keyboard should build");
    (keyboard, log)
}

/// Writes `content` to `name` inside a fresh temp dir.
pub fn create_temp_file(name: &str, content: &str) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(name);
    fs::write(&path, content).expect("Failed to write temp file");
    (path, temp_dir)
}

/// Writes an additional file into an existing temp dir.
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write temp file");
    path
}
