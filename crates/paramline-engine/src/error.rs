use thiserror::Error;

/// Errors returned by timeline mutations and queries. A call that fails
/// leaves the timeline and its sink exactly as they were.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimelineError {
    #[error("invalid value {value}: {reason}")]
    InvalidValue { value: String, reason: &'static str },
    #[error("unknown frequency name '{0}'")]
    UnknownFrequencyName(String),
    #[error("invalid time ordering: {start}s to {end}s")]
    InvalidTimeOrdering { start: f64, end: f64 },
    #[error("timeline has no events and the sink reports no value")]
    EmptyTimeline,
    #[error("sink can take {free} more calls but {needed} are needed")]
    SinkFull { needed: usize, free: usize },
}

impl TimelineError {
    pub fn invalid(value: impl std::fmt::Display, reason: &'static str) -> Self {
        TimelineError::InvalidValue {
            value: value.to_string(),
            reason,
        }
    }

    pub fn ordering(start: f64, end: f64) -> Self {
        TimelineError::InvalidTimeOrdering { start, end }
    }
}

/// Scheduled times must be finite and not before the timeline origin.
pub(crate) fn check_time(time: f64) -> Result<(), TimelineError> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(TimelineError::ordering(0.0, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_non_finite_times() {
        assert!(check_time(0.0).is_ok());
        assert!(check_time(12.5).is_ok());
        assert_eq!(check_time(-1.0), Err(TimelineError::ordering(0.0, -1.0)));
        assert!(check_time(f64::NAN).is_err());
        assert!(check_time(f64::INFINITY).is_err());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = TimelineError::invalid(-3.0, "below the parameter minimum");
        assert_eq!(err.to_string(), "invalid value -3: below the parameter minimum");
        let err = TimelineError::SinkFull { needed: 2, free: 1 };
        assert_eq!(err.to_string(), "sink can take 1 more calls but 2 are needed");
    }
}
