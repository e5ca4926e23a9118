//! TUI module for saavy
//!
//! Draws the synth status, a lit two-octave keyboard and an oscilloscope.

mod keys;
pub mod state;
mod status;
mod waveform;

use std::collections::VecDeque;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub use state::{Controls, StatusUpdate};

use keys::render_keys;
use status::render_status;
use waveform::render_waveform;

/// Everything one frame draws.
pub struct View<'a> {
    pub controls: &'a Controls,
    pub status: &'a StatusUpdate,
    pub scope: &'a VecDeque<f32>,
    pub sample_rate: f32,
    /// Terminal reports key releases; otherwise notes use a fixed gate.
    pub key_release: bool,
}

pub fn draw(frame: &mut Frame, view: &View) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Status
            Constraint::Length(5), // Keyboard
            Constraint::Min(6),    // Oscilloscope
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    render_status(frame, chunks[0], view);
    render_keys(frame, chunks[1], view);
    render_waveform(frame, chunks[2], view.scope);

    let help = Paragraph::new(
        " [Tab] Algorithm  [F1] Waveform  [F2] LFO  [F3] LFO target  \
         [↑↓] LFO rate  [←→] LFO depth  [Space] Release all  [Bksp] Silence  [Esc] Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}
