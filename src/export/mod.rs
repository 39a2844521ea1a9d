//! Text rendering of keyboards.
//!
//! Provides [`TextSurface`], a headless rendering surface that draws the
//! mounted keyboard as a box diagram for terminals, logs and tests.

pub mod keyboard_renderer;

pub use keyboard_renderer::{TextSurface, TextSurfaceRegistry, MIN_CELL_WIDTH};
