//! Render command: draws a layout as a text diagram.

use crate::cli::common::{load_config, print_json, CliError, CliResult, LayoutSource};
use crate::config::MIN_KEY_WIDTH;
use crate::export::TextSurface;
use crate::keyboard::{EventRegistry, Keyboard};
use clap::Args;

/// Render a layout as a box diagram
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: LayoutSource,

    /// Key cell width in characters (overrides ui.key_width)
    #[arg(short, long, value_name = "N")]
    pub width: Option<usize>,

    /// Draw with ASCII characters only
    #[arg(long)]
    pub plain: bool,

    /// Hide the secondary label line
    #[arg(long)]
    pub no_alt: bool,

    /// Keys to show disabled (comma-separated identifiers)
    #[arg(long, value_name = "KEYS", value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Keys to show highlighted (comma-separated identifiers)
    #[arg(long, value_name = "KEYS", value_delimiter = ',')]
    pub highlight: Vec<String>,

    /// Print the mounted view as JSON instead of drawing it
    #[arg(long)]
    pub json: bool,
}

impl RenderArgs {
    /// Execute the render command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;

        let width = self.width.unwrap_or(config.ui.key_width);
        if width < MIN_KEY_WIDTH {
            return Err(CliError::validation(format!(
                "Key width must be at least {MIN_KEY_WIDTH}, got {width}"
            )));
        }

        let surface = TextSurface::from_config(&config.ui)
            .with_cell_width(width)
            .with_alt_labels(config.ui.show_alt_labels && !self.no_alt)
            .with_ascii(self.plain);
        let builder = self.source.builder(&config)?;
        let mut keyboard = self.source.build(builder, surface)?;

        apply_flags(&mut keyboard, &self.disable, &self.highlight)?;

        if self.json {
            return print_json(&keyboard.view());
        }
        print!("{}", keyboard.surface().render());
        Ok(())
    }
}

/// Applies `--disable` and `--highlight`; unknown identifiers are errors.
pub(crate) fn apply_flags(
    keyboard: &mut Keyboard<TextSurface, EventRegistry>,
    disable: &[String],
    highlight: &[String],
) -> CliResult<()> {
    for id in disable {
        if !keyboard.enable_key(id, false) {
            return Err(CliError::validation(format!("Unknown key '{id}'")));
        }
    }
    for id in highlight {
        if !keyboard.highlight_key(id, true) {
            return Err(CliError::validation(format!("Unknown key '{id}'")));
        }
    }
    Ok(())
}
