//! Rendering surface interface and the view model handed to it.

use crate::models::LabelDirection;
use crate::services::{ResolvedKey, ResolvedLayout};
use serde::Serialize;

/// One label of a key, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelView {
    /// Position on the key face
    pub position: usize,
    /// True for the main slot
    pub is_main: bool,
    /// Label strings
    pub values: Vec<String>,
    /// Relative font size (1.0 when unset)
    pub size: f32,
    /// Flow direction of multiple values
    pub direction: LabelDirection,
}

/// Visual state of a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyVisualState {
    /// Activation is ignored
    pub disabled: bool,
    /// Emphasized
    pub hilighted: bool,
    /// Currently pressed
    pub pressed: bool,
}

/// One key, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyView {
    /// Region identifier
    pub id: String,
    /// Labels in slot declaration order
    pub labels: Vec<LabelView>,
    /// Visual state
    #[serde(flatten)]
    pub state: KeyVisualState,
}

/// One grid column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnView {
    /// Keys top to bottom
    pub keys: Vec<KeyView>,
}

/// One grid row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowView {
    /// Columns left to right; empty columns are kept
    pub columns: Vec<ColumnView>,
}

/// Everything a surface needs to draw the keyboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardView {
    /// Active layout name
    pub layout_name: String,
    /// Active layout title
    pub title: Option<String>,
    /// Relative key width, `1 / longest row`
    pub key_width: f64,
    /// Grid rows; empty rows are kept
    pub rows: Vec<RowView>,
}

impl KeyboardView {
    /// Builds the view of a resolved layout. `is_pressed` reports the
    /// pressed state by key index.
    pub fn build(resolved: &ResolvedLayout, is_pressed: impl Fn(usize) -> bool) -> Self {
        let rows = resolved
            .grid
            .rows
            .iter()
            .map(|row| RowView {
                columns: row
                    .columns
                    .iter()
                    .map(|column| ColumnView {
                        keys: column
                            .keys
                            .iter()
                            .map(|&i| key_view(resolved, &resolved.keys[i], is_pressed(i)))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            layout_name: resolved.name.clone(),
            title: resolved.title.clone(),
            key_width: resolved.key_width(),
            rows,
        }
    }

    /// Iterates over every key view in row, column, key order.
    pub fn keys(&self) -> impl Iterator<Item = &KeyView> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .flat_map(|c| c.keys.iter())
    }
}

fn key_view(resolved: &ResolvedLayout, key: &ResolvedKey, pressed: bool) -> KeyView {
    let labels = resolved
        .slots
        .iter()
        .zip(&key.labels)
        .map(|(slot, values)| LabelView {
            position: slot.position,
            is_main: slot.is_main,
            values: values.clone(),
            size: slot.size.unwrap_or(1.0),
            direction: slot.direction,
        })
        .collect();

    KeyView {
        id: key.id(),
        labels,
        state: KeyVisualState {
            disabled: key.disabled,
            hilighted: key.hilighted,
            pressed,
        },
    }
}

/// A host rendering target.
///
/// The widget mounts a full [`KeyboardView`] on every render and then
/// updates single keys by region identifier as their state changes.
pub trait Surface {
    /// Returns false if the surface cannot host a keyboard.
    fn is_valid(&self) -> bool {
        true
    }

    /// Replaces the surface content with `view`.
    fn mount(&mut self, view: &KeyboardView);

    /// Updates the visual state of one key.
    fn update_key(&mut self, id: &str, state: KeyVisualState);

    /// Moves input focus to a key. Surfaces without focus ignore this.
    fn focus_key(&mut self, _id: &str) {}

    /// Removes all content.
    fn clear(&mut self);

    /// Returns true if a key region with this identifier is mounted.
    fn contains_key(&self, id: &str) -> bool;
}

/// Finds a surface by selector, e.g. an element id in the host.
pub trait SurfaceLocator {
    /// Surface type produced
    type Surface: Surface;

    /// Looks up a surface; `None` if nothing matches.
    fn locate(&mut self, selector: &str) -> Option<Self::Surface>;
}
