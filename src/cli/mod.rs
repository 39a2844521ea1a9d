//! CLI command handlers for OKeyboard.
//!
//! Headless, scriptable access to layout resolution, rendering and the
//! press-state engine, for authoring layouts and for automation.

pub mod common;
pub mod config;
pub mod inspect;
pub mod render;
pub mod simulate;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use inspect::InspectArgs;
pub use render::RenderArgs;
pub use simulate::SimulateArgs;
