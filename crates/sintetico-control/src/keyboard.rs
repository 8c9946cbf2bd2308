//! Computer-keyboard note layout.

use sintetico_config::KeyboardConfig;
use sintetico_core::midi_to_freq;

/// Maps characters to fixed pitches, one semitone per key.
///
/// Lookups are case-insensitive. The default is the common tracker layout:
/// the home row plays white keys from C4, the row above plays black keys.
///
/// ```rust
/// use sintetico_control::KeyboardLayout;
///
/// let layout = KeyboardLayout::default();
/// assert_eq!(layout.note_for('a'), Some(60));
/// assert_eq!(layout.note_for('W'), Some(61));
/// assert_eq!(layout.note_for('q'), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardLayout {
    keys: Vec<(char, u8)>,
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::from_config(&KeyboardConfig::default())
    }
}

impl KeyboardLayout {
    /// Build a layout where `keys[i]` plays MIDI note `base_note + i`.
    ///
    /// Keys past MIDI 127 are dropped; a repeated key keeps its first note.
    pub fn new(keys: &str, base_note: u8) -> Self {
        let mut layout = Vec::new();
        for (offset, c) in keys.chars().enumerate() {
            let c = c.to_ascii_lowercase();
            let Some(note) = u8::try_from(usize::from(base_note) + offset)
                .ok()
                .filter(|n| *n <= 127)
            else {
                break;
            };
            if layout.iter().all(|(k, _)| *k != c) {
                layout.push((c, note));
            }
        }
        Self { keys: layout }
    }

    /// Build the layout described by a `[keyboard]` table.
    pub fn from_config(config: &KeyboardConfig) -> Self {
        Self::new(&config.keys, config.base_note)
    }

    /// MIDI note played by `key`.
    pub fn note_for(&self, key: char) -> Option<u8> {
        let key = key.to_ascii_lowercase();
        self.keys.iter().find(|(k, _)| *k == key).map(|(_, n)| *n)
    }

    /// Pitch in Hz played by `key`.
    pub fn frequency_for(&self, key: char) -> Option<f32> {
        self.note_for(key).map(midi_to_freq)
    }

    /// Mapped keys with their notes, lowest first.
    pub fn keys(&self) -> impl Iterator<Item = (char, u8)> + '_ {
        self.keys.iter().copied()
    }

    /// Number of mapped keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is mapped.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_spans_an_octave() {
        let layout = KeyboardLayout::default();
        assert_eq!(layout.len(), 13);
        assert_eq!(layout.note_for('k'), Some(72));
        let c4 = layout.frequency_for('a').unwrap();
        assert!((c4 - 261.626).abs() < 0.01);
    }

    #[test]
    fn notes_past_midi_range_are_dropped() {
        let layout = KeyboardLayout::new("abcd", 126);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.note_for('c'), None);
    }

    #[test]
    fn repeated_key_keeps_first_note() {
        let layout = KeyboardLayout::new("aba", 60);
        assert_eq!(layout.note_for('a'), Some(60));
        assert_eq!(layout.note_for('b'), Some(61));
    }
}
