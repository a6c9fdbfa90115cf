use serde::Serialize;

use super::curve;

/// Shape of a scheduled transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EventKind {
    Set,
    Linear,
    Exponential,
    Target { time_constant: f64 },
    Curve { values: Vec<f64>, duration: f64 },
}

impl EventKind {
    pub fn is_ramp(&self) -> bool {
        matches!(self, EventKind::Linear | EventKind::Exponential)
    }
}

/// One scheduled transition on a timeline.
///
/// `start_time`/`end_time` bound the transition; `start_value`/`end_value`
/// are its boundary values. For [`EventKind::Target`], `end_value` is the
/// asymptote and `end_time` stays infinite until a later event supersedes it.
/// `scheduled_at` is the time the caller passed when scheduling: the end of a
/// ramp, the start of everything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomationEvent {
    pub kind: EventKind,
    pub start_time: f64,
    pub end_time: f64,
    pub start_value: f64,
    pub end_value: f64,
    pub scheduled_at: f64,
}

impl AutomationEvent {
    pub fn set(time: f64, value: f64) -> Self {
        Self {
            kind: EventKind::Set,
            start_time: time,
            end_time: time,
            start_value: value,
            end_value: value,
            scheduled_at: time,
        }
    }

    pub fn linear(start_time: f64, start_value: f64, end_time: f64, end_value: f64) -> Self {
        Self::ramp(EventKind::Linear, start_time, start_value, end_time, end_value)
    }

    pub fn exponential(start_time: f64, start_value: f64, end_time: f64, end_value: f64) -> Self {
        Self::ramp(
            EventKind::Exponential,
            start_time,
            start_value,
            end_time,
            end_value,
        )
    }

    pub(crate) fn ramp(
        kind: EventKind,
        start_time: f64,
        start_value: f64,
        end_time: f64,
        end_value: f64,
    ) -> Self {
        debug_assert!(kind.is_ramp());
        Self {
            kind,
            start_time,
            end_time,
            start_value,
            end_value,
            scheduled_at: end_time,
        }
    }

    pub fn target(start_time: f64, start_value: f64, target: f64, time_constant: f64) -> Self {
        Self {
            kind: EventKind::Target { time_constant },
            start_time,
            end_time: f64::INFINITY,
            start_value,
            end_value: target,
            scheduled_at: start_time,
        }
    }

    /// Curve spanning `[start_time, start_time + duration]`. `values` must
    /// hold at least one sample.
    pub fn curve(start_time: f64, duration: f64, values: Vec<f64>) -> Self {
        let start_value = values.first().copied().unwrap_or_default();
        let end_value = values.last().copied().unwrap_or_default();
        Self {
            kind: EventKind::Curve { values, duration },
            start_time,
            end_time: start_time + duration,
            start_value,
            end_value,
            scheduled_at: start_time,
        }
    }

    pub fn is_ramp(&self) -> bool {
        self.kind.is_ramp()
    }

    /// Open-ended target that has not been superseded yet.
    pub fn is_open(&self) -> bool {
        self.end_time.is_infinite()
    }

    pub fn is_instant(&self) -> bool {
        self.end_time == self.start_time
    }

    /// Half-open coverage `[start, end)`; an instant covers nothing.
    pub fn covers(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Value of this event at `time`, holding its boundary values outside
    /// its span.
    pub fn value_at(&self, time: f64) -> f64 {
        match &self.kind {
            EventKind::Set => self.end_value,
            EventKind::Linear => curve::linear(
                self.start_time,
                self.start_value,
                self.end_time,
                self.end_value,
                time,
            ),
            EventKind::Exponential => curve::exponential(
                self.start_time,
                self.start_value,
                self.end_time,
                self.end_value,
                time,
            ),
            EventKind::Target { time_constant } => curve::target(
                self.start_time,
                self.start_value,
                self.end_value,
                *time_constant,
                time.min(self.end_time),
            ),
            EventKind::Curve { values, duration } => {
                curve::curve(values, self.start_time, *duration, time.min(self.end_time))
            }
        }
    }

    /// Value this event leaves behind once it is over. An open target never
    /// finishes, so its start value is reported.
    pub fn final_value(&self) -> f64 {
        match self.kind {
            EventKind::Set | EventKind::Linear | EventKind::Exponential => self.end_value,
            EventKind::Target { .. } if self.is_open() => self.start_value,
            EventKind::Target { .. } | EventKind::Curve { .. } => self.value_at(self.end_time),
        }
    }

    /// Cuts the event short at `time`, keeping its trajectory up to that
    /// point. A clipped ramp is keyed by its start from then on.
    pub(crate) fn clip_end(&mut self, time: f64) {
        if time >= self.end_time || time < self.start_time {
            return;
        }
        match self.kind {
            EventKind::Set => {}
            EventKind::Linear | EventKind::Exponential => {
                self.end_value = self.value_at(time);
                self.end_time = time;
                self.scheduled_at = self.start_time;
            }
            EventKind::Target { .. } => {
                self.end_time = time;
            }
            EventKind::Curve { .. } => {
                self.end_value = self.value_at(time);
                self.end_time = time;
            }
        }
    }

    /// Splits a ramp at `time`. `self` keeps the leading piece and the
    /// returned remainder runs from `(time, value)` to the original end.
    pub(crate) fn split_ramp(&mut self, time: f64, value: f64) -> Option<AutomationEvent> {
        if !self.is_ramp() || !(self.start_time < time && time < self.end_time) {
            return None;
        }
        let mut remainder = self.clone();
        remainder.start_time = time;
        remainder.start_value = value;
        self.clip_end(time);
        Some(remainder)
    }

    /// Re-keys a ramp that now ends the schedule. An exponential ramp that
    /// would only jump at its end keeps holding its start value.
    pub(crate) fn settle_end(&mut self) {
        if !self.is_ramp() {
            return;
        }
        self.scheduled_at = self.start_time;
        if matches!(self.kind, EventKind::Exponential)
            && !self.is_instant()
            && !curve::exponential_compatible(self.start_value, self.end_value)
        {
            self.end_value = self.start_value;
        }
    }

    /// Moves a ramp's start so it continues from `(time, value)`.
    pub(crate) fn rebase_start(&mut self, time: f64, value: f64) {
        if self.is_ramp() {
            self.start_time = time.min(self.end_time);
            self.start_value = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_holds_its_value_everywhere() {
        let event = AutomationEvent::set(1.0, 10.0);
        assert!(event.is_instant());
        assert!(!event.covers(1.0));
        assert_eq!(event.value_at(0.0), 10.0);
        assert_eq!(event.value_at(5.0), 10.0);
        assert_eq!(event.scheduled_at, 1.0);
    }

    #[test]
    fn ramps_are_keyed_by_their_end() {
        let event = AutomationEvent::linear(1.0, 10.0, 3.0, 50.0);
        assert_eq!(event.scheduled_at, 3.0);
        assert!(event.covers(1.0));
        assert!(!event.covers(3.0));
        assert_eq!(event.value_at(2.0), 30.0);
        assert_eq!(event.final_value(), 50.0);
    }

    #[test]
    fn clipping_a_ramp_preserves_its_curve() {
        let mut event = AutomationEvent::exponential(0.0, 5.0, 4.0, 20.0);
        let before = event.value_at(1.0);
        event.clip_end(2.0);
        assert_eq!(event.end_time, 2.0);
        assert!((event.end_value - 10.0).abs() < 1e-9);
        assert!((event.value_at(1.0) - before).abs() < 1e-12);
        assert_eq!(event.scheduled_at, 0.0);
    }

    #[test]
    fn split_ramp_returns_remainder() {
        let mut event = AutomationEvent::linear(0.0, 0.0, 4.0, 8.0);
        let remainder = event.split_ramp(1.0, 100.0).unwrap();
        assert_eq!(event.end_time, 1.0);
        assert_eq!(event.end_value, 2.0);
        assert_eq!(remainder.start_time, 1.0);
        assert_eq!(remainder.start_value, 100.0);
        assert_eq!(remainder.end_time, 4.0);
        assert_eq!(remainder.scheduled_at, 4.0);
        assert!(event.split_ramp(1.0, 0.0).is_none());
    }

    #[test]
    fn settled_jump_ramp_holds_start() {
        let mut event = AutomationEvent::exponential(0.0, 0.0, 1.0, 4.0);
        assert_eq!(event.value_at(0.99), 0.0);
        event.settle_end();
        assert_eq!(event.scheduled_at, 0.0);
        assert_eq!(event.value_at(1.0), 0.0);
    }

    #[test]
    fn target_is_open_until_clipped() {
        let mut event = AutomationEvent::target(0.0, 0.0, 100.0, 2.0);
        assert!(event.is_open());
        assert!(event.covers(1e9));
        assert_eq!(event.final_value(), 0.0);
        event.clip_end(2.0);
        assert!(!event.is_open());
        let expected = 100.0 - 100.0 * (-1.0f64).exp();
        assert!((event.final_value() - expected).abs() < 1e-9);
        assert!((event.value_at(10.0) - expected).abs() < 1e-9);
        assert_eq!(event.end_value, 100.0);
    }

    #[test]
    fn clipped_curve_holds_value_at_cut() {
        let mut event = AutomationEvent::curve(0.0, 2.0, vec![0.0, 10.0, 0.0]);
        event.clip_end(0.5);
        assert_eq!(event.end_time, 0.5);
        assert!((event.final_value() - 5.0).abs() < 1e-9);
        assert!((event.value_at(1.5) - 5.0).abs() < 1e-9);
    }
}
