//! Semantic units and the conversion applied to every scheduled value.

use std::fmt;
use std::sync::Arc;

use paramline_utils::db::db_to_gain;
use paramline_utils::{EqualTemperament, PitchResolver};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Unit tag of a parameter. Picks the conversion and the default bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Raw,
    Frequency,
    Gain,
    NormalRange,
    AudioRange,
    Positive,
}

impl Unit {
    /// `(min, max)` a converted value must fall within.
    pub fn range(self) -> (f64, f64) {
        match self {
            Unit::Raw => (f64::NEG_INFINITY, f64::INFINITY),
            Unit::Frequency | Unit::Gain | Unit::Positive => (0.0, f64::INFINITY),
            Unit::NormalRange => (0.0, 1.0),
            Unit::AudioRange => (-1.0, 1.0),
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            Unit::Frequency => 440.0,
            Unit::Gain => 1.0,
            Unit::Raw | Unit::NormalRange | Unit::AudioRange | Unit::Positive => 0.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Unit::Raw => "raw",
            Unit::Frequency => "frequency",
            Unit::Gain => "gain",
            Unit::NormalRange => "normal_range",
            Unit::AudioRange => "audio_range",
            Unit::Positive => "positive",
        };
        f.write_str(name)
    }
}

/// A value as the caller expressed it, before unit conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    /// Symbolic pitch such as `"A4"`; frequency parameters only.
    Pitch(String),
    /// Decibel magnitude; gain parameters only.
    Decibels(f64),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(name: &str) -> Self {
        ParamValue::Pitch(name.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(name: String) -> Self {
        ParamValue::Pitch(name)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(value) => write!(f, "{value}"),
            ParamValue::Pitch(name) => write!(f, "'{name}'"),
            ParamValue::Decibels(db) => write!(f, "{db}dB"),
        }
    }
}

/// Turns [`ParamValue`]s into raw numbers for a unit. Bounds are checked by
/// the owning [`ParamSpec`](crate::ParamSpec).
#[derive(Clone)]
pub struct UnitConverter {
    resolver: Arc<dyn PitchResolver>,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(Arc::new(EqualTemperament::default()))
    }
}

impl fmt::Debug for UnitConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitConverter").finish_non_exhaustive()
    }
}

impl UnitConverter {
    pub fn new(resolver: Arc<dyn PitchResolver>) -> Self {
        Self { resolver }
    }

    pub fn convert(&self, unit: Unit, value: &ParamValue) -> Result<f64, TimelineError> {
        let raw = match (unit, value) {
            (_, ParamValue::Number(number)) => *number,
            (Unit::Frequency, ParamValue::Pitch(name)) => self
                .resolver
                .name_to_frequency(name)
                .map_err(|_| TimelineError::UnknownFrequencyName(name.clone()))?,
            (Unit::Gain, ParamValue::Decibels(db)) => db_to_gain(*db),
            (_, ParamValue::Pitch(_)) => {
                return Err(TimelineError::invalid(
                    value,
                    "pitch names only apply to frequency parameters",
                ))
            }
            (_, ParamValue::Decibels(_)) => {
                return Err(TimelineError::invalid(
                    value,
                    "decibels only apply to gain parameters",
                ))
            }
        };
        if raw.is_finite() {
            Ok(raw)
        } else {
            Err(TimelineError::invalid(value, "converts to a non-finite number"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramline_utils::db::gain_to_db;
    use paramline_utils::PitchTable;

    #[test]
    fn numbers_pass_through_every_unit() {
        let converter = UnitConverter::default();
        for unit in [Unit::Raw, Unit::Frequency, Unit::Gain, Unit::NormalRange] {
            assert_eq!(converter.convert(unit, &0.5.into()).unwrap(), 0.5);
        }
    }

    #[test]
    fn frequency_resolves_pitch_names() {
        let converter = UnitConverter::default();
        let hz = converter.convert(Unit::Frequency, &"A3".into()).unwrap();
        assert!((hz - 220.0).abs() < 1e-9);
        assert_eq!(
            converter.convert(Unit::Frequency, &"Q9".into()),
            Err(TimelineError::UnknownFrequencyName("Q9".into()))
        );
    }

    #[test]
    fn injected_table_replaces_default_tuning() {
        let converter = UnitConverter::new(Arc::new(PitchTable::new([("low", 30.0)])));
        assert_eq!(
            converter.convert(Unit::Frequency, &"low".into()).unwrap(),
            30.0
        );
        assert!(converter.convert(Unit::Frequency, &"A4".into()).is_err());
    }

    #[test]
    fn gain_decibels_round_trip() {
        let converter = UnitConverter::default();
        let linear = converter
            .convert(Unit::Gain, &ParamValue::Decibels(-12.0))
            .unwrap();
        assert!((gain_to_db(linear) + 12.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_inputs_are_invalid() {
        let converter = UnitConverter::default();
        assert!(matches!(
            converter.convert(Unit::Raw, &"A4".into()),
            Err(TimelineError::InvalidValue { .. })
        ));
        assert!(matches!(
            converter.convert(Unit::Frequency, &ParamValue::Decibels(3.0)),
            Err(TimelineError::InvalidValue { .. })
        ));
        assert!(matches!(
            converter.convert(Unit::Raw, &f64::NAN.into()),
            Err(TimelineError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unit_tags_serialize_in_snake_case() {
        let json = serde_json::to_string(&Unit::NormalRange).unwrap();
        assert_eq!(json, "\"normal_range\"");
        assert_eq!(Unit::AudioRange.range(), (-1.0, 1.0));
    }
}
