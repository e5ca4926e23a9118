//! saavy - play the synth from the computer keyboard
//!
//! Run with: cargo run
//! Set RUST_LOG (e.g. `RUST_LOG=saavy_synth=debug`) to log to saavy.log.

mod app;
mod keyboard;
mod ui;

use std::{fs::File, io::stdout, sync::Mutex};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};
use tracing_subscriber::EnvFilter;

use app::{App, Audio};

const LOG_FILE: &str = "saavy.log";

/// The terminal owns stdout, so logs go to a file and only when asked for.
fn init_logging() -> EyreResult<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    let file = File::create(LOG_FILE).wrap_err_with(|| format!("failed to create {LOG_FILE}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let audio = Audio::start()?;

    // Query before entering raw mode; without release events notes use a fixed gate
    let key_release = supports_keyboard_enhancement().unwrap_or(false);
    if key_release {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    }
    tracing::info!(key_release, "keyboard input");

    let mut terminal = ratatui::init();
    let result = App::new(audio, key_release).run(&mut terminal);
    ratatui::restore();

    if key_release {
        execute!(stdout(), PopKeyboardEnhancementFlags)?;
    }
    result
}
