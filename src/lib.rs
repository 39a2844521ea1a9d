//! OKeyboard Library
//!
//! Core of a configurable on-screen keyboard widget: named label tables,
//! layouts whose key labels are derived from those tables, automatic grid
//! placement, and a press-state engine that reconciles pointer and keystroke
//! input into key down/up callbacks. Rendering and input are injected through
//! the [`keyboard::Surface`] and [`keyboard::EventSource`] traits.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod keyboard;
pub mod models;
pub mod services;

pub use error::KeyboardError;
pub use keyboard::{Keyboard, KeyboardBuilder};
