//! OKeyboard - on-screen keyboard layout tool
//!
//! Renders, inspects and exercises keyboard layouts from the command line.

use clap::{Parser, Subcommand};
use okeyboard::cli::{ConfigArgs, InspectArgs, RenderArgs, SimulateArgs};
use okeyboard::constants::APP_NAME;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// OKeyboard - on-screen keyboard layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw a layout as a text diagram
    Render(RenderArgs),
    /// Print resolved labels, codes and grid cells as JSON
    Inspect(InspectArgs),
    /// Feed a scripted event sequence and report callbacks
    Simulate(SimulateArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "okeyboard=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Command::Render(args) => args.execute(),
        Command::Inspect(args) => args.execute(),
        Command::Simulate(args) => args.execute(),
        Command::Config(args) => args.execute(),
    };

    if let Err(err) = result {
        use std::io::Write;
        let _ = std::io::stdout().flush();
        eprintln!("{APP_NAME}: {err}");
        std::process::exit(err.exit_code());
    }
}
