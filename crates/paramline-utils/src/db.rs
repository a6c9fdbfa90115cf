//! Conversions between linear gain and decibels.

use crate::Decibels;

/// Minimum linear value treated as silence to avoid numerical issues.
const MIN_LINEAR: f64 = 1e-12;

/// Converts a linear gain factor to decibels.
#[inline]
pub fn gain_to_db(gain: f64) -> Decibels {
    if gain <= MIN_LINEAR {
        f64::NEG_INFINITY
    } else {
        20.0 * gain.log10()
    }
}

/// Converts decibels to a linear gain factor, `10^(dB / 20)`.
#[inline]
pub fn db_to_gain(db: Decibels) -> f64 {
    if db == f64::NEG_INFINITY {
        0.0
    } else {
        10f64.powf(db / 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_roundtrip() {
        let values = [0.001, 0.1, 0.5, 1.0, 2.0, 10.0];
        for value in values {
            let db = gain_to_db(value);
            let round = db_to_gain(db);
            assert!((round - value).abs() < 1e-9 * value.max(1.0));
        }
    }

    #[test]
    fn known_points() {
        assert_eq!(db_to_gain(0.0), 1.0);
        assert!((db_to_gain(-6.0) - 0.501_187).abs() < 1e-6);
        assert!((db_to_gain(20.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn silence_maps_to_negative_infinity() {
        assert_eq!(gain_to_db(0.0), f64::NEG_INFINITY);
        assert_eq!(db_to_gain(f64::NEG_INFINITY), 0.0);
    }
}
