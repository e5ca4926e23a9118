//! Two-octave keyboard widget, lit by the voices sounding on each key

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_synth::dsp::envelope::EnvelopeState;

use super::View;
use crate::keyboard::{is_black, note_key, note_name, LAYOUT};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Envelope peaks top out at 0.5, so that fills the bar.
const FULL_LEVEL: f32 = 0.5;

fn stage_color(stage: EnvelopeState) -> Color {
    match stage {
        EnvelopeState::Attack | EnvelopeState::Decay => Color::LightGreen,
        EnvelopeState::Sustain => Color::Green,
        EnvelopeState::Release => Color::Yellow,
        EnvelopeState::Idle => Color::DarkGray,
    }
}

pub fn render_keys(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" Keys ").borders(Borders::ALL);

    let mut names = Vec::with_capacity(LAYOUT.len());
    let mut labels = Vec::with_capacity(LAYOUT.len());
    let mut meters = Vec::with_capacity(LAYOUT.len());

    for (semitone, &c) in LAYOUT.iter().enumerate() {
        let base = if is_black(semitone) {
            Style::default().fg(Color::Gray).bg(Color::Black)
        } else {
            Style::default().fg(Color::Black).bg(Color::Gray)
        };

        let light = view.status.light(note_key(c));
        let label_style = match light {
            Some(v) => base.bg(stage_color(v.stage)).add_modifier(Modifier::BOLD),
            None => base,
        };
        let meter = match light {
            Some(v) => {
                let idx = ((v.level / FULL_LEVEL) * (BARS.len() - 1) as f32).round();
                BARS[(idx.max(0.0) as usize).min(BARS.len() - 1)]
            }
            None => ' ',
        };

        names.push(Span::styled(
            format!("{:^4}", note_name(semitone)),
            Style::default().fg(Color::DarkGray),
        ));
        labels.push(Span::styled(format!(" {c}  "), label_style));
        meters.push(Span::styled(
            format!(" {meter}  "),
            Style::default().fg(light.map_or(Color::DarkGray, |v| stage_color(v.stage))),
        ));
    }

    let paragraph = Paragraph::new(vec![Line::from(names), Line::from(labels), Line::from(meters)])
        .block(block);
    frame.render_widget(paragraph, area);
}
