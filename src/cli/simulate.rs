//! Simulate command: feeds a scripted event sequence to a headless keyboard
//! and reports the callbacks it fires.
//!
//! Event script syntax (comma-separated):
//!
//! | Token          | Event                                 |
//! |----------------|---------------------------------------|
//! | `down:ID`      | pointer down on key region `ID`       |
//! | `up:ID`        | pointer up on key region `ID`         |
//! | `pointerup`    | pointer up outside any key            |
//! | `press:KEY`    | physical keystroke down               |
//! | `release:KEY`  | physical keystroke up                 |
//! | `blur`         | window focus lost                     |
//!
//! A backslash escapes the next character, so `down:Enter\,Return` targets
//! an aliased key and `press:\,` sends a comma keystroke.

use crate::cli::common::{load_config, print_json, CliError, CliResult, LayoutSource};
use crate::cli::render::apply_flags;
use crate::export::TextSurface;
use crate::keyboard::{InputEvent, KeyEvent};
use crate::services::ResolvedKey;
use clap::Args;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Simulate pointer and keystroke input
#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub source: LayoutSource,

    /// Event script, e.g. "down:a,up:a,press:b,blur"
    #[arg(short, long, value_name = "SCRIPT")]
    pub events: String,

    /// Keys to disable before the script runs (comma-separated identifiers)
    #[arg(long, value_name = "KEYS", value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Callback names whose handler fails, to exercise error isolation
    #[arg(long, value_name = "CALLBACKS", value_delimiter = ',')]
    pub fail: Vec<String>,

    /// Draw the keyboard after the script
    #[arg(long)]
    pub show: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One callback invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredCallback {
    /// Index of the script step that caused it (`None` before the script)
    pub step: Option<usize>,
    /// `onKeyDown`, `onKeyUp` or `onPress`
    pub callback: String,
    /// Key region identifier
    pub key: String,
    /// Why the callback fired
    pub cause: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport {
    callbacks: Vec<FiredCallback>,
    pressed: Vec<String>,
    diagnostics: Vec<String>,
}

/// Parses one script token.
pub fn parse_event(token: &str) -> CliResult<InputEvent> {
    let token = token.trim();
    let (verb, arg) = match token.split_once(':') {
        Some((verb, arg)) => (verb, Some(arg.to_string())),
        None => (token, None),
    };
    let required = |arg: Option<String>| {
        arg.filter(|a| !a.is_empty())
            .ok_or_else(|| CliError::validation(format!("Event '{token}' needs a key: {verb}:ID")))
    };

    match verb {
        "down" => Ok(InputEvent::PointerDown { key: required(arg)? }),
        "up" => Ok(InputEvent::PointerUp { key: Some(required(arg)?) }),
        "pointerup" => Ok(InputEvent::PointerUp { key: None }),
        "press" => Ok(InputEvent::KeyDown { key: required(arg)? }),
        "release" => Ok(InputEvent::KeyUp { key: required(arg)? }),
        "blur" => Ok(InputEvent::FocusLost),
        _ => Err(CliError::validation(format!(
            "Unknown event '{token}': expected down, up, pointerup, press, release or blur"
        ))),
    }
}

/// Parses a comma-separated script. Empty tokens are skipped.
pub fn parse_script(script: &str) -> CliResult<Vec<InputEvent>> {
    split_script(script)
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| parse_event(t))
        .collect()
}

/// Splits on unescaped commas; `\x` yields `x`.
fn split_script(script: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.push(chars.next().unwrap_or('\\')),
            ',' => tokens.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    tokens.push(current);
    tokens
}

impl SimulateArgs {
    /// Execute the simulate command
    pub fn execute(&self) -> CliResult<()> {
        let events = parse_script(&self.events)?;
        for name in &self.fail {
            if !matches!(name.as_str(), "onKeyDown" | "onKeyUp" | "onPress") {
                return Err(CliError::validation(format!(
                    "Unknown callback '{name}': expected onKeyDown, onKeyUp or onPress"
                )));
            }
        }

        let config = load_config()?;
        let step: Rc<RefCell<Option<usize>>> = Rc::new(RefCell::new(None));
        let fired: Rc<RefCell<Vec<FiredCallback>>> = Rc::new(RefCell::new(Vec::new()));

        let mut builder = self.source.builder(&config)?;
        for name in ["onKeyDown", "onKeyUp", "onPress"] {
            let (step, fired) = (step.clone(), fired.clone());
            let fail = self.fail.iter().any(|f| f == name);
            let callback = move |key: &ResolvedKey, event: &KeyEvent| -> anyhow::Result<()> {
                fired.borrow_mut().push(FiredCallback {
                    step: *step.borrow(),
                    callback: name.to_string(),
                    key: key.id(),
                    cause: event.cause.to_string(),
                });
                if fail {
                    anyhow::bail!("simulated failure");
                }
                Ok(())
            };
            builder = match name {
                "onKeyDown" => builder.on_key_down(callback),
                "onKeyUp" => builder.on_key_up(callback),
                _ => builder.on_press(callback),
            };
        }

        let mut keyboard = self
            .source
            .build(builder, TextSurface::from_config(&config.ui))?;
        apply_flags(&mut keyboard, &self.disable, &[])?;

        for (index, event) in events.iter().enumerate() {
            *step.borrow_mut() = Some(index);
            let changed = keyboard.handle_event(event);
            tracing::debug!(step = index, ?event, changed, "Simulated event");
        }

        let report = SimulationReport {
            callbacks: fired.borrow().clone(),
            pressed: keyboard.pressed_keys().iter().map(|k| k.id()).collect(),
            diagnostics: keyboard
                .take_diagnostics()
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        if self.json {
            return print_json(&report);
        }

        for fired in &report.callbacks {
            let step = fired.step.map_or_else(|| "-".to_string(), |s| s.to_string());
            println!("[{step}] {} {} ({})", fired.callback, fired.key, fired.cause);
        }
        println!("Pressed: {}", report.pressed.join(" "));
        for diagnostic in &report.diagnostics {
            println!("Error: {diagnostic}");
        }
        if self.show {
            print!("{}", keyboard.surface().render());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let events = parse_script("down:a, up:a,pointerup,press:B,release:B,blur,").unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::PointerDown { key: "a".into() },
                InputEvent::PointerUp { key: Some("a".into()) },
                InputEvent::PointerUp { key: None },
                InputEvent::KeyDown { key: "B".into() },
                InputEvent::KeyUp { key: "B".into() },
                InputEvent::FocusLost,
            ]
        );
    }

    #[test]
    fn test_parse_script_escapes() {
        let events = parse_script(r"down:Enter\,Return,press:\,,release:\\").unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::PointerDown { key: "Enter,Return".into() },
                InputEvent::KeyDown { key: ",".into() },
                InputEvent::KeyUp { key: "\\".into() },
            ]
        );
    }

    #[test]
    fn test_parse_event_errors() {
        assert_eq!(parse_event("down").unwrap_err().exit_code(), 1);
        assert_eq!(parse_event("down:").unwrap_err().exit_code(), 1);
        assert!(parse_event("hover:a").unwrap_err().message().contains("Unknown event"));
    }
}
