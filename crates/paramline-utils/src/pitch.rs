//! Symbolic pitch names (`"A4"`, `"C#3"`, `"Bb2"`) resolved to frequencies.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

/// Errors produced while resolving a pitch name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PitchError {
    #[error("empty pitch name")]
    Empty,
    #[error("invalid pitch letter in '{0}'")]
    InvalidLetter(String),
    #[error("invalid octave in '{0}'")]
    InvalidOctave(String),
    #[error("unknown pitch name '{0}'")]
    Unknown(String),
}

/// Read-only lookup from a pitch name to a frequency in Hz.
pub trait PitchResolver: Send + Sync {
    fn name_to_frequency(&self, name: &str) -> Result<f64, PitchError>;
}

impl<R: PitchResolver + ?Sized> PitchResolver for Arc<R> {
    fn name_to_frequency(&self, name: &str) -> Result<f64, PitchError> {
        (**self).name_to_frequency(name)
    }
}

impl<R: PitchResolver + ?Sized> PitchResolver for &R {
    fn name_to_frequency(&self, name: &str) -> Result<f64, PitchError> {
        (**self).name_to_frequency(name)
    }
}

/// Twelve-tone equal temperament anchored at a configurable A4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualTemperament {
    pub a4: f64,
}

impl Default for EqualTemperament {
    fn default() -> Self {
        Self { a4: 440.0 }
    }
}

impl EqualTemperament {
    pub fn new(a4: f64) -> Self {
        Self { a4 }
    }

    /// Frequency of a (possibly fractional) MIDI note number.
    #[inline]
    pub fn midi_to_frequency(&self, note: f64) -> f64 {
        self.a4 * 2f64.powf((note - 69.0) / 12.0)
    }
}

impl PitchResolver for EqualTemperament {
    fn name_to_frequency(&self, name: &str) -> Result<f64, PitchError> {
        let note = parse_note_name(name)?;
        Ok(self.midi_to_frequency(note as f64))
    }
}

/// Parses `<letter>[accidentals][octave]` into a MIDI note number.
///
/// Accidentals are `#` or `b`, repeated at most twice. A missing octave
/// means octave 4.
pub fn parse_note_name(name: &str) -> Result<i32, PitchError> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    let letter = chars.next().ok_or(PitchError::Empty)?;
    let base = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(PitchError::InvalidLetter(trimmed.to_string())),
    };

    let rest = chars.as_str();
    let accidental_len = rest
        .char_indices()
        .take_while(|(_, c)| *c == '#' || *c == 'b')
        .count();
    if accidental_len > 2 {
        return Err(PitchError::InvalidLetter(trimmed.to_string()));
    }
    let (accidentals, octave) = rest.split_at(accidental_len);
    let offset: i32 = accidentals
        .chars()
        .map(|c| if c == '#' { 1 } else { -1 })
        .sum();

    let octave = if octave.is_empty() {
        4
    } else {
        octave
            .parse::<i32>()
            .map_err(|_| PitchError::InvalidOctave(trimmed.to_string()))?
    };

    Ok((octave + 1) * 12 + base + offset)
}

/// Fixed name-to-frequency table, optionally backed by another resolver for
/// names it does not contain.
#[derive(Clone, Default)]
pub struct PitchTable {
    entries: HashMap<String, f64>,
    fallback: Option<Arc<dyn PitchResolver>>,
}

impl PitchTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, hz)| (name.into(), hz))
                .collect(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn PitchResolver>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl std::fmt::Debug for PitchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PitchTable")
            .field("entries", &self.entries.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl PitchResolver for PitchTable {
    fn name_to_frequency(&self, name: &str) -> Result<f64, PitchError> {
        if let Some(hz) = self.entries.get(name.trim()) {
            return Ok(*hz);
        }
        match &self.fallback {
            Some(fallback) => fallback.name_to_frequency(name),
            None => Err(PitchError::Unknown(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn parses_naturals_and_accidentals() {
        assert_eq!(parse_note_name("C4").unwrap(), 60);
        assert_eq!(parse_note_name("A4").unwrap(), 69);
        assert_eq!(parse_note_name("C#4").unwrap(), 61);
        assert_eq!(parse_note_name("Db4").unwrap(), 61);
        assert_eq!(parse_note_name("Bb3").unwrap(), 58);
        assert_eq!(parse_note_name("C-1").unwrap(), 0);
        assert_eq!(parse_note_name("F##2").unwrap(), 43);
    }

    #[test]
    fn missing_octave_defaults_to_four() {
        assert_eq!(parse_note_name("A").unwrap(), 69);
        assert_eq!(parse_note_name("e").unwrap(), 64);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_note_name(""), Err(PitchError::Empty));
        assert!(matches!(
            parse_note_name("H2"),
            Err(PitchError::InvalidLetter(_))
        ));
        assert!(matches!(
            parse_note_name("C#x"),
            Err(PitchError::InvalidOctave(_))
        ));
        assert!(matches!(
            parse_note_name("C###4"),
            Err(PitchError::InvalidLetter(_))
        ));
    }

    #[test]
    fn equal_temperament_frequencies() {
        let tuning = EqualTemperament::default();
        assert!(approx(tuning.name_to_frequency("A4").unwrap(), 440.0));
        assert!(approx(tuning.name_to_frequency("A3").unwrap(), 220.0));
        assert!(approx(tuning.name_to_frequency("C4").unwrap(), 261.625_565));

        let baroque = EqualTemperament::new(415.0);
        assert!(approx(baroque.name_to_frequency("A4").unwrap(), 415.0));
    }

    #[test]
    fn table_prefers_entries_then_fallback() {
        let table = PitchTable::new([("kick", 55.0)]);
        assert_eq!(table.name_to_frequency("kick").unwrap(), 55.0);
        assert_eq!(
            table.name_to_frequency("A4"),
            Err(PitchError::Unknown("A4".into()))
        );

        let table = table.with_fallback(Arc::new(EqualTemperament::default()));
        assert!(approx(table.name_to_frequency("A4").unwrap(), 440.0));
    }
}
