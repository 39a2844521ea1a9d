//! Text surface: renders the keyboard as a box-drawing diagram.
//!
//! [`TextSurface`] is a headless [`Surface`] used by the CLI and by tests.
//! It keeps the mounted view plus per-key visual state and draws them on
//! demand.
//!
//! # Example
//!
//! ```text
//! Layout: en (English)
//! ┌───────┐┌───────┐┌───────┐
//! │   Q   ││   W   ││   E   │
//! │  .--- ││  .--  ││   .   │
//! └───────┘└───────┘└───────┘
//! ```

use crate::config::UiConfig;
use crate::keyboard::{KeyView, KeyVisualState, KeyboardView, LabelView, Surface, SurfaceLocator};
use crate::models::LabelDirection;
use std::collections::HashMap;

/// Minimum cell width that still leaves room for one character.
pub const MIN_CELL_WIDTH: usize = 3;

/// Characters used to draw one key box.
#[derive(Debug, Clone, Copy)]
struct BoxChars {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
}

const LIGHT: BoxChars = BoxChars {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
};

const HEAVY: BoxChars = BoxChars {
    top_left: '┏',
    top_right: '┓',
    bottom_left: '┗',
    bottom_right: '┛',
    horizontal: '━',
    vertical: '┃',
};

const ASCII: BoxChars = BoxChars {
    top_left: '+',
    top_right: '+',
    bottom_left: '+',
    bottom_right: '+',
    horizontal: '-',
    vertical: '|',
};

const ASCII_PRESSED: BoxChars = BoxChars {
    top_left: '#',
    top_right: '#',
    bottom_left: '#',
    bottom_right: '#',
    horizontal: '=',
    vertical: '#',
};

/// Headless surface that draws keys as text boxes.
#[derive(Debug, Clone)]
pub struct TextSurface {
    cell_width: usize,
    show_alt_labels: bool,
    state_markers: bool,
    ascii: bool,
    view: Option<KeyboardView>,
    states: HashMap<String, KeyVisualState>,
    focused: Option<String>,
}

impl TextSurface {
    /// Creates a surface with the given cell width (borders included).
    #[must_use]
    pub fn new(cell_width: usize) -> Self {
        Self {
            cell_width,
            show_alt_labels: true,
            state_markers: true,
            ascii: false,
            view: None,
            states: HashMap::new(),
            focused: None,
        }
    }

    /// Creates a surface from UI settings.
    #[must_use]
    pub fn from_config(ui: &UiConfig) -> Self {
        Self::new(ui.key_width)
            .with_alt_labels(ui.show_alt_labels)
            .with_state_markers(ui.state_markers)
    }

    /// Changes the cell width.
    #[must_use]
    pub const fn with_cell_width(mut self, cell_width: usize) -> Self {
        self.cell_width = cell_width;
        self
    }

    /// Shows or hides the second label line.
    #[must_use]
    pub const fn with_alt_labels(mut self, show: bool) -> Self {
        self.show_alt_labels = show;
        self
    }

    /// Marks disabled (`x`) and highlighted (`+`) keys in the top border.
    #[must_use]
    pub const fn with_state_markers(mut self, markers: bool) -> Self {
        self.state_markers = markers;
        self
    }

    /// Draws with plain ASCII instead of box-drawing characters.
    #[must_use]
    pub const fn with_ascii(mut self, ascii: bool) -> Self {
        self.ascii = ascii;
        self
    }

    /// The mounted view, if any.
    #[must_use]
    pub fn view(&self) -> Option<&KeyboardView> {
        self.view.as_ref()
    }

    /// Current visual state of a key.
    #[must_use]
    pub fn key_state(&self, id: &str) -> Option<KeyVisualState> {
        self.states.get(id).copied()
    }

    /// Key that last received focus.
    #[must_use]
    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Draws the mounted keyboard. Empty when nothing is mounted.
    #[must_use]
    pub fn render(&self) -> String {
        let Some(view) = &self.view else {
            return String::new();
        };

        let mut output = match &view.title {
            Some(title) => format!("Layout: {} ({title})\n", view.layout_name),
            None => format!("Layout: {}\n", view.layout_name),
        };

        for row in &view.rows {
            let keys: Vec<(usize, &KeyView)> = row
                .columns
                .iter()
                .filter(|c| !c.keys.is_empty())
                .enumerate()
                .flat_map(|(group, c)| c.keys.iter().map(move |k| (group, k)))
                .collect();
            if !keys.is_empty() {
                output.push_str(&self.render_row(&keys));
            }
        }

        output
    }

    fn render_row(&self, keys: &[(usize, &KeyView)]) -> String {
        let height = if self.show_alt_labels { 4 } else { 3 };
        let groups = keys.last().map_or(0, |(group, _)| group + 1);
        let width = keys.len() * self.cell_width + groups.saturating_sub(1);

        let mut buffer = vec![vec![' '; width]; height];
        let mut col = 0;
        let mut current_group = 0;
        for &(group, key) in keys {
            if group != current_group {
                col += 1;
                current_group = group;
            }
            self.render_key_box(&mut buffer, col, key);
            col += self.cell_width;
        }

        let mut output = String::new();
        for line in &buffer {
            let line: String = line.iter().collect();
            output.push_str(line.trim_end());
            output.push('\n');
        }
        output
    }

    fn render_key_box(&self, buffer: &mut [Vec<char>], col: usize, key: &KeyView) {
        let width = self.cell_width;
        let height = buffer.len();
        if width < MIN_CELL_WIDTH || height < 3 {
            return;
        }

        let state = self.states.get(&key.id).copied().unwrap_or(key.state);
        let chars = match (self.ascii, state.pressed) {
            (false, false) => LIGHT,
            (false, true) => HEAVY,
            (true, false) => ASCII,
            (true, true) => ASCII_PRESSED,
        };

        let bottom = height - 1;
        let right = col + width - 1;
        for c in col + 1..right {
            buffer[0][c] = chars.horizontal;
            buffer[bottom][c] = chars.horizontal;
        }
        buffer[0][col] = chars.top_left;
        buffer[0][right] = chars.top_right;
        buffer[bottom][col] = chars.bottom_left;
        buffer[bottom][right] = chars.bottom_right;
        for line in buffer.iter_mut().take(bottom).skip(1) {
            line[col] = chars.vertical;
            line[right] = chars.vertical;
        }

        if self.state_markers {
            if state.disabled {
                buffer[0][col + 1] = 'x';
            }
            if state.hilighted {
                buffer[0][right - 1] = '+';
            }
        }

        let (main, alt) = label_lines(key);
        write_centered_text(buffer, 1, col + 1, width - 2, &main);
        if self.show_alt_labels {
            write_centered_text(buffer, 2, col + 1, width - 2, &alt);
        }
    }
}

/// Main slot text and the remaining slots' text, in position order. A key
/// without slots shows its identifier.
fn label_lines(key: &KeyView) -> (String, String) {
    if key.labels.is_empty() {
        return (key.id.clone(), String::new());
    }

    let mut alt: Vec<&LabelView> = key.labels.iter().filter(|l| !l.is_main).collect();
    alt.sort_by_key(|l| l.position);

    let main = key
        .labels
        .iter()
        .find(|l| l.is_main)
        .map(label_text)
        .unwrap_or_default();
    let alt = alt
        .into_iter()
        .map(label_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (main, alt)
}

fn label_text(label: &LabelView) -> String {
    let separator = match label.direction {
        LabelDirection::Row => " ",
        LabelDirection::Column => "/",
    };
    label.values.join(separator)
}

/// Writes text centered in a row, truncating it to `width`.
fn write_centered_text(buffer: &mut [Vec<char>], row: usize, start_col: usize, width: usize, text: &str) {
    let Some(line) = buffer.get_mut(row) else {
        return;
    };

    let text_len = text.chars().count();
    let padding = width.saturating_sub(text_len) / 2;
    for (i, ch) in text.chars().take(width).enumerate() {
        if let Some(cell) = line.get_mut(start_col + padding + i) {
            *cell = ch;
        }
    }
}

impl Surface for TextSurface {
    fn is_valid(&self) -> bool {
        self.cell_width >= MIN_CELL_WIDTH
    }

    fn mount(&mut self, view: &KeyboardView) {
        self.states = view.keys().map(|k| (k.id.clone(), k.state)).collect();
        self.view = Some(view.clone());
    }

    fn update_key(&mut self, id: &str, state: KeyVisualState) {
        match self.states.get_mut(id) {
            Some(current) => *current = state,
            None => tracing::warn!(key = id, "update for a key that is not mounted"),
        }
    }

    fn focus_key(&mut self, id: &str) {
        self.focused = Some(id.to_string());
    }

    fn clear(&mut self) {
        self.view = None;
        self.states.clear();
        self.focused = None;
    }

    fn contains_key(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }
}

/// Hands out text surfaces by name, for hosts that look containers up by
/// selector. Each selector can be located once.
#[derive(Debug, Default)]
pub struct TextSurfaceRegistry {
    surfaces: HashMap<String, TextSurface>,
}

impl TextSurfaceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a surface under `selector`.
    #[must_use]
    pub fn with_surface(mut self, selector: impl Into<String>, surface: TextSurface) -> Self {
        self.surfaces.insert(selector.into(), surface);
        self
    }
}

impl SurfaceLocator for TextSurfaceRegistry {
    type Surface = TextSurface;

    fn locate(&mut self, selector: &str) -> Option<TextSurface> {
        self.surfaces.remove(selector)
    }
}
