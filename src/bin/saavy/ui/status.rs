//! Status bar widget - algorithm, LFO routing, voices and audio stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_synth::dsp::lfo::ModTarget;

use super::View;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_samples<'a>(samples: impl ExactSizeIterator<Item = &'a f32>) -> Self {
        let len = samples.len();
        if len == 0 {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let (peak, sum_sq) = samples.fold((0.0f32, 0.0f32), |(peak, sum), &x| {
            (peak.max(x.abs()), sum + x * x)
        });
        Self {
            peak,
            rms: (sum_sq / len as f32).sqrt(),
        }
    }
}

fn target_name(target: Option<ModTarget>) -> &'static str {
    match target {
        None => "none",
        Some(ModTarget::MasterGain) => "master gain",
        Some(ModTarget::Pitch) => "pitch",
        Some(ModTarget::FmIndex) => "fm index",
        Some(ModTarget::AmDepth) => "am depth",
    }
}

pub fn render_status(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" saavy ").borders(Borders::ALL);
    let controls = view.controls;
    let status = view.status;
    let stats = AudioStats::from_samples(view.scope.iter());

    let synth_line = Line::from(vec![
        Span::styled(
            format!(" {:<8}", controls.algorithm.name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{:<10}", controls.waveform.name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("voices {}/{}  ", status.held_count, status.voice_count),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("gain {:.3}  ", status.master_gain),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:.1}s @ {:.1}kHz  ", status.time, view.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let (lfo_state, lfo_color) = if controls.lfo_active {
        ("on ", Color::Green)
    } else {
        ("off", Color::DarkGray)
    };
    let lfo_line = Line::from(vec![
        Span::styled(format!(" LFO {lfo_state}  "), Style::default().fg(lfo_color)),
        Span::styled(
            format!(
                "{:.1} Hz  depth {:.2}  → {}",
                controls.lfo_frequency,
                controls.lfo_depth,
                target_name(controls.lfo_target)
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            if view.key_release {
                "   key release"
            } else {
                "   fixed gate"
            },
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(vec![synth_line, lfo_line]).block(block);
    frame.render_widget(paragraph, area);
}
