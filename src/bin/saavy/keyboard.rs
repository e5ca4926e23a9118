//! Computer keyboard as a two-octave piano, C4 to B5.
//!
//! Bottom row plays the lower octave (white keys on z x c v b n m, black keys
//! on the home row above them), the top row plus digits the upper one.

use saavy_synth::synth::NoteKey;

/// Keys in chromatic order starting at C4.
pub const LAYOUT: [char; 24] = [
    'z', 's', 'x', 'd', 'c', 'v', 'g', 'b', 'h', 'n', 'j', 'm', //
    'q', '2', 'w', '3', 'e', 'r', '5', 't', '6', 'y', '7', 'u',
];

const C4: f32 = 261.625_57;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Position of `c` in the layout (case-insensitive).
pub fn semitone(c: char) -> Option<usize> {
    let c = c.to_ascii_lowercase();
    LAYOUT.iter().position(|&k| k == c)
}

/// Equal-tempered frequency for a key, if it is part of the layout.
pub fn frequency(c: char) -> Option<f32> {
    semitone(c).map(|n| C4 * 2f32.powf(n as f32 / 12.0))
}

/// Voice key for a layout character.
pub fn note_key(c: char) -> NoteKey {
    c.to_ascii_lowercase() as NoteKey
}

/// Layout character for a voice key.
pub fn key_char(key: NoteKey) -> Option<char> {
    char::from_u32(key).filter(|c| LAYOUT.contains(c))
}

/// Note name such as `A4` for a layout position.
pub fn note_name(semitone: usize) -> String {
    format!("{}{}", NOTE_NAMES[semitone % 12], 4 + semitone / 12)
}

pub fn is_black(semitone: usize) -> bool {
    matches!(semitone % 12, 1 | 3 | 6 | 8 | 10)
}
