use std::fmt;
use std::sync::Arc;

use paramline_utils::profiling::SpanTimer;
use paramline_utils::{Clock, MonotonicClock, PitchResolver};

use super::curve::exponential_compatible;
use super::event::{AutomationEvent, EventKind};
use super::sink::ParamSink;
use crate::config::ParamSpec;
use crate::error::{check_time, TimelineError};
use crate::units::{ParamValue, Unit, UnitConverter};

/// Where a new ramp begins.
#[derive(Debug, Clone, Copy)]
enum RampStart {
    /// Nothing scheduled yet: the ramp collapses into a jump at its end.
    Fresh,
    /// The preceding event is over by the ramp's end.
    After { time: f64, value: f64 },
    /// A ramp spans the new end; the new ramp takes over its start.
    Split { time: f64, value: f64 },
    /// A target or curve spans the new end and is cut at `time`.
    Supersede { time: f64, value: f64 },
}

/// Scheduled-value timeline for one audio parameter.
///
/// Events are kept ordered by start time and never overlap; the event in
/// force at `t` is the last one starting at or before `t`, and it holds its
/// final value once it is over. Ramps always start where the event before
/// them ends. Every mutation is mirrored onto the sink after validation, so
/// a failed call changes neither the timeline nor the sink.
pub struct Timeline<S, C = MonotonicClock> {
    spec: ParamSpec,
    converter: UnitConverter,
    events: Vec<AutomationEvent>,
    sink: S,
    clock: C,
}

impl<S: ParamSink> Timeline<S, MonotonicClock> {
    pub fn new(spec: ParamSpec, sink: S) -> Self {
        Self::with_clock(spec, sink, MonotonicClock::new())
    }
}

impl<S: ParamSink, C: Clock> Timeline<S, C> {
    /// Binds a timeline to `sink`. The [`ParamSpec`] default (or, without one, the
    /// sink's observed value) becomes a `Set` anchor at time 0.
    pub fn with_clock(spec: ParamSpec, sink: S, clock: C) -> Self {
        let anchor = spec
            .default
            .or_else(|| sink.value())
            .filter(|value| value.is_finite())
            .map(|value| AutomationEvent::set(0.0, spec.clamp(value)));
        if anchor.is_none() {
            tracing::debug!(param = %spec.name, "timeline starts without an anchor value");
        }
        Self {
            spec,
            converter: UnitConverter::default(),
            events: anchor.into_iter().collect(),
            sink,
            clock,
        }
    }

    /// Resolves pitch names through `resolver` instead of A440 equal temperament.
    pub fn with_resolver(mut self, resolver: Arc<dyn PitchResolver>) -> Self {
        self.converter = UnitConverter::new(resolver);
        self
    }

    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    pub fn unit(&self) -> Unit {
        self.spec.unit
    }

    pub fn min_value(&self) -> f64 {
        self.spec.min_value()
    }

    pub fn max_value(&self) -> f64 {
        self.spec.max_value()
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Value at the clock's current time.
    pub fn value(&self) -> Result<f64, TimelineError> {
        self.value_at(self.clock.now())
    }

    /// Value at `time`. Before the first event this is the first event's
    /// start value; with no events at all the sink's observed value is used.
    pub fn value_at(&self, time: f64) -> Result<f64, TimelineError> {
        if time.is_nan() {
            return Err(TimelineError::ordering(0.0, time));
        }
        let Some(first) = self.events.first() else {
            return self.sink.value().ok_or(TimelineError::EmptyTimeline);
        };
        let value = match self.in_force(time) {
            Some(index) => self.events[index].value_at(time),
            None => first.start_value,
        };
        Ok(value)
    }

    /// Samples `output.len()` values starting at `start`.
    pub fn render_block(
        &self,
        start: f64,
        sample_rate: f64,
        output: &mut [f64],
    ) -> Result<(), TimelineError> {
        if start.is_nan() {
            return Err(TimelineError::ordering(0.0, start));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(TimelineError::invalid(
                sample_rate,
                "sample rate must be positive",
            ));
        }
        if output.is_empty() {
            return Ok(());
        }
        let timer = SpanTimer::new("timeline.render_block");
        let Some(first) = self.events.first() else {
            let value = self.sink.value().ok_or(TimelineError::EmptyTimeline)?;
            output.fill(value);
            return Ok(());
        };

        let mut cursor = self.events.partition_point(|event| event.start_time <= start);
        for (offset, sample) in output.iter_mut().enumerate() {
            let time = start + offset as f64 / sample_rate;
            while cursor < self.events.len() && self.events[cursor].start_time <= time {
                cursor += 1;
            }
            *sample = match cursor.checked_sub(1) {
                Some(index) => self.events[index].value_at(time),
                None => first.start_value,
            };
        }
        timer.finish();
        Ok(())
    }

    pub fn set_value_at_time(
        &mut self,
        value: impl Into<ParamValue>,
        time: f64,
    ) -> Result<(), TimelineError> {
        check_time(time)?;
        let value = self.convert(value.into())?;
        self.reserve(1)?;
        tracing::trace!(param = %self.spec.name, value, time, "set value");
        self.sink.set_value_at_time(value, time);
        self.insert_set(time, value);
        Ok(())
    }

    pub fn linear_ramp_to_value_at_time(
        &mut self,
        value: impl Into<ParamValue>,
        end_time: f64,
    ) -> Result<(), TimelineError> {
        self.schedule_ramp(EventKind::Linear, value.into(), end_time)
    }

    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        value: impl Into<ParamValue>,
        end_time: f64,
    ) -> Result<(), TimelineError> {
        self.schedule_ramp(EventKind::Exponential, value.into(), end_time)
    }

    /// Starts an open-ended approach toward `target` at `start_time`, from
    /// whatever the value is at that moment.
    pub fn set_target_at_time(
        &mut self,
        target: impl Into<ParamValue>,
        start_time: f64,
        time_constant: f64,
    ) -> Result<(), TimelineError> {
        check_time(start_time)?;
        let target = self.convert(target.into())?;
        if !(time_constant.is_finite() && time_constant > 0.0) {
            return Err(TimelineError::invalid(
                time_constant,
                "time constant must be positive",
            ));
        }
        let start_value = self.value_at(start_time)?;
        self.reserve(1)?;
        let now = self.clock.now();

        tracing::trace!(
            param = %self.spec.name,
            target,
            start_time,
            time_constant,
            "set target"
        );
        self.sink.set_target_at_time(target, start_time, time_constant);

        let index = self.insertion_index(start_time);
        if let Some(prev) = self.before_mut(index) {
            if prev.covers(start_time) {
                let held = prev.value_at(start_time);
                match prev.split_ramp(start_time, held) {
                    Some(remainder) => {
                        tracing::debug!(
                            param = %self.spec.name,
                            start_time,
                            "target interrupts ramp"
                        );
                        self.events.insert(index, remainder);
                    }
                    None => prev.clip_end(start_time),
                }
            }
        }

        while let Some(event) = self.events.get(index) {
            let superseded =
                event.start_time == start_time && !event.is_instant() && !event.is_ramp();
            if !superseded {
                break;
            }
            self.events.remove(index);
        }

        let mut event = AutomationEvent::target(start_time, start_value, target, time_constant);
        if let Some(next) = self.events.get(index) {
            event.end_time = if next.is_ramp() {
                now.clamp(next.start_time, next.end_time)
            } else {
                next.start_time
            };
        }
        self.events.insert(index, event);
        self.reanchor(index + 1);
        Ok(())
    }

    /// Schedules `values` spread evenly over `[start_time, start_time + duration]`
    /// as a single curve event.
    pub fn set_value_curve_at_time<I, V>(
        &mut self,
        values: I,
        start_time: f64,
        duration: f64,
    ) -> Result<(), TimelineError>
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        check_time(start_time)?;
        let end_time = start_time + duration;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(TimelineError::ordering(start_time, end_time));
        }
        let values = values
            .into_iter()
            .map(|value| self.convert(value.into()))
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() < 2 {
            return Err(TimelineError::invalid(
                values.len(),
                "a value curve needs at least two samples",
            ));
        }

        let index = self.insertion_index(start_time);
        if let Some(next) = self.events.get(index) {
            if next.start_time < end_time {
                return Err(TimelineError::ordering(start_time, next.start_time));
            }
        }
        if let Some(prev) = index.checked_sub(1).map(|i| &self.events[i]) {
            if prev.is_ramp() && prev.end_time > start_time {
                return Err(TimelineError::ordering(start_time, prev.end_time));
            }
        }

        self.reserve(1)?;

        tracing::trace!(
            param = %self.spec.name,
            samples = values.len(),
            start_time,
            duration,
            "set value curve"
        );
        self.sink.set_value_curve_at_time(&values, start_time, duration);
        if let Some(prev) = self.before_mut(index) {
            prev.clip_end(start_time);
        }
        self.events
            .insert(index, AutomationEvent::curve(start_time, duration, values));
        self.reanchor(index + 1);
        Ok(())
    }

    /// Drops everything scheduled at or after `time`. The event in force at
    /// `time` is cut there, so the timeline holds the value it had just
    /// before `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) -> Result<(), TimelineError> {
        check_time(time)?;
        self.reserve(1)?;
        tracing::trace!(param = %self.spec.name, time, "cancel scheduled values");
        self.sink.cancel_scheduled_values(time);
        self.truncate_at(time);
        Ok(())
    }

    /// Like [`Timeline::cancel_scheduled_values`], then pins the value that
    /// was in force at `time` with a `Set`.
    pub fn cancel_and_hold_at_time(&mut self, time: f64) -> Result<(), TimelineError> {
        check_time(time)?;
        let held = self.value_at(time)?;
        self.reserve(self.hold_calls())?;

        tracing::trace!(param = %self.spec.name, time, held, "cancel and hold");
        if self.sink.supports_cancel_and_hold() {
            self.sink.cancel_and_hold_at_time(time);
        } else {
            self.sink.cancel_scheduled_values(time);
            self.sink.set_value_at_time(held, time);
        }

        self.truncate_at(time);
        let index = self.events.partition_point(|event| event.start_time <= time);
        match self.before_mut(index) {
            Some(last) if last.start_time == time && matches!(last.kind, EventKind::Set) => {
                *last = AutomationEvent::set(time, held);
            }
            _ => self.events.insert(index, AutomationEvent::set(time, held)),
        }
        Ok(())
    }

    /// Pins the current trajectory at `time` so a following ramp starts from
    /// the value the parameter actually has there.
    pub fn set_ramp_point(&mut self, time: f64) -> Result<(), TimelineError> {
        self.cancel_and_hold_at_time(time)
    }

    /// Ramps from the value at `start_time` to `value` over `ramp_time`.
    /// Frequencies ramp exponentially, everything else linearly.
    pub fn ramp_to(
        &mut self,
        value: impl Into<ParamValue>,
        ramp_time: f64,
        start_time: f64,
    ) -> Result<(), TimelineError> {
        let kind = match self.spec.unit {
            Unit::Frequency => EventKind::Exponential,
            _ => EventKind::Linear,
        };
        self.ramp_from_hold(kind, value.into(), ramp_time, start_time)
    }

    pub fn linear_ramp_to(
        &mut self,
        value: impl Into<ParamValue>,
        ramp_time: f64,
        start_time: f64,
    ) -> Result<(), TimelineError> {
        self.ramp_from_hold(EventKind::Linear, value.into(), ramp_time, start_time)
    }

    pub fn exponential_ramp_to(
        &mut self,
        value: impl Into<ParamValue>,
        ramp_time: f64,
        start_time: f64,
    ) -> Result<(), TimelineError> {
        self.ramp_from_hold(EventKind::Exponential, value.into(), ramp_time, start_time)
    }

    /// Exponential approach from the value at `start_time` that lands on
    /// `value` after `ramp_time`.
    pub fn target_ramp_to(
        &mut self,
        value: impl Into<ParamValue>,
        ramp_time: f64,
        start_time: f64,
    ) -> Result<(), TimelineError> {
        let value = value.into();
        check_time(start_time)?;
        // Fail before the hold point is written.
        self.convert(value.clone())?;
        self.value_at(start_time)?;
        self.reserve(2 * self.hold_calls() + 2)?;
        self.set_ramp_point(start_time)?;
        self.exponential_approach_value_at_time(value, start_time, ramp_time)
    }

    /// Target approach whose time constant is derived from `ramp_time`,
    /// finished by a short linear ramp so the value lands exactly on
    /// `value` at `time + ramp_time`.
    pub fn exponential_approach_value_at_time(
        &mut self,
        value: impl Into<ParamValue>,
        time: f64,
        ramp_time: f64,
    ) -> Result<(), TimelineError> {
        check_time(time)?;
        if !(ramp_time.is_finite() && ramp_time > 0.0) {
            return Err(TimelineError::ordering(time, time + ramp_time));
        }
        let value = self.convert(value.into())?;
        self.reserve(self.hold_calls() + 2)?;
        let time_constant = (ramp_time + 1.0).ln() / 200f64.ln();
        self.set_target_at_time(value, time, time_constant)?;
        self.cancel_and_hold_at_time(time + ramp_time * 0.9)?;
        self.linear_ramp_to_value_at_time(value, time + ramp_time)
    }

    fn ramp_from_hold(
        &mut self,
        kind: EventKind,
        value: ParamValue,
        ramp_time: f64,
        start_time: f64,
    ) -> Result<(), TimelineError> {
        check_time(start_time)?;
        let end_time = start_time + ramp_time;
        if !(ramp_time.is_finite() && ramp_time >= 0.0) {
            return Err(TimelineError::ordering(start_time, end_time));
        }
        let value = self.convert(value)?;
        let held = self.value_at(start_time)?;
        if matches!(kind, EventKind::Exponential)
            && ramp_time > 0.0
            && !exponential_compatible(held, value)
        {
            return Err(TimelineError::invalid(
                value,
                "exponential ramps need non-zero endpoints of the same sign",
            ));
        }
        self.reserve(self.hold_calls() + 1)?;
        self.set_ramp_point(start_time)?;
        self.schedule_ramp(kind, ParamValue::Number(value), end_time)
    }

    fn schedule_ramp(
        &mut self,
        kind: EventKind,
        value: ParamValue,
        end_time: f64,
    ) -> Result<(), TimelineError> {
        check_time(end_time)?;
        let value = self.convert(value)?;
        let now = self.clock.now();

        let index = self.insertion_index(end_time);
        if let Some(next) = self.events.get(index) {
            // The curve would own `end_time` and the ramp could never land.
            if next.start_time == end_time && matches!(next.kind, EventKind::Curve { .. }) {
                return Err(TimelineError::ordering(end_time, next.end_time));
            }
        }
        let start = match index.checked_sub(1).map(|i| &self.events[i]) {
            None => RampStart::Fresh,
            Some(prev) if prev.end_time <= end_time => RampStart::After {
                time: prev.end_time,
                value: prev.final_value(),
            },
            Some(prev) if prev.is_ramp() => RampStart::Split {
                time: prev.start_time,
                value: prev.start_value,
            },
            Some(prev) => {
                let time = now.clamp(prev.start_time, end_time);
                RampStart::Supersede {
                    time,
                    value: prev.value_at(time),
                }
            }
        };
        let (start_time, start_value) = match start {
            RampStart::Fresh => (end_time, value),
            RampStart::After { time, value }
            | RampStart::Split { time, value }
            | RampStart::Supersede { time, value } => (time, value),
        };
        if matches!(kind, EventKind::Exponential)
            && start_time < end_time
            && !exponential_compatible(start_value, value)
        {
            return Err(TimelineError::invalid(
                value,
                "exponential ramps need non-zero endpoints of the same sign",
            ));
        }
        self.reserve(1)?;

        tracing::trace!(param = %self.spec.name, ?kind, value, end_time, "ramp");
        match kind {
            EventKind::Exponential => {
                self.sink.exponential_ramp_to_value_at_time(value, end_time)
            }
            _ => self.sink.linear_ramp_to_value_at_time(value, end_time),
        }

        let ramp = AutomationEvent::ramp(kind, start_time, start_value, end_time, value);
        match start {
            RampStart::Fresh | RampStart::After { .. } => self.events.insert(index, ramp),
            RampStart::Split { .. } => {
                let prev = &mut self.events[index - 1];
                let remainder = prev.split_ramp(end_time, value);
                *prev = ramp;
                if let Some(remainder) = remainder {
                    self.events.insert(index, remainder);
                }
                tracing::debug!(param = %self.spec.name, end_time, "ramp split an existing ramp");
            }
            RampStart::Supersede { time, .. } => {
                self.events[index - 1].clip_end(time);
                self.events.insert(index, ramp);
                tracing::debug!(
                    param = %self.spec.name,
                    at = time,
                    "ramp supersedes target or curve"
                );
            }
        }
        self.reanchor(index + 1);
        Ok(())
    }

    fn insert_set(&mut self, time: f64, value: f64) {
        let index = self.events.partition_point(|event| event.start_time < time);
        let mut remainder = None;
        if let Some(prev) = self.before_mut(index) {
            if prev.covers(time) {
                remainder = prev.split_ramp(time, value);
                if remainder.is_none() {
                    prev.clip_end(time);
                }
            }
        }

        // Instants and targets/curves starting here are replaced; a ramp
        // starting here is kept and re-anchored below.
        while let Some(event) = self.events.get(index) {
            if event.start_time != time || (event.is_ramp() && !event.is_instant()) {
                break;
            }
            self.events.remove(index);
        }

        self.events.insert(index, AutomationEvent::set(time, value));
        if let Some(remainder) = remainder {
            self.events.insert(index + 1, remainder);
        }
        self.reanchor(index + 1);
    }

    /// Cuts the event in force at `time` and removes everything scheduled at
    /// or after it. Whatever starts the timeline at the origin is pinned to a
    /// `Set` of its initial value, so a cancel at 0 leaves that value alone.
    fn truncate_at(&mut self, time: f64) {
        let index = self.events.partition_point(|event| event.start_time < time);
        if let Some(prev) = self.before_mut(index) {
            if prev.end_time >= time && !prev.is_instant() {
                prev.clip_end(time);
                prev.settle_end();
            }
        }

        let origin = match self.events.first() {
            Some(first) if first.start_time == 0.0 && first.scheduled_at >= time => {
                Some(match first.kind {
                    EventKind::Set => first.clone(),
                    _ => AutomationEvent::set(0.0, first.value_at(0.0)),
                })
            }
            _ => None,
        };
        let before = self.events.len();
        self.events.retain(|event| event.scheduled_at < time);
        if let Some(origin) = origin {
            self.events.insert(0, origin);
        }
        tracing::debug!(
            param = %self.spec.name,
            time,
            removed = before - self.events.len(),
            "truncated timeline"
        );
    }

    /// Makes the event at `index` continue from its predecessor: ramps move
    /// their start onto the predecessor's end, targets take its final value.
    fn reanchor(&mut self, index: usize) {
        let Some(prev) = index.checked_sub(1).and_then(|i| self.events.get(i)) else {
            return;
        };
        if prev.is_open() {
            return;
        }
        let (time, value) = (prev.end_time, prev.final_value());
        if let Some(event) = self.events.get_mut(index) {
            match event.kind {
                EventKind::Linear | EventKind::Exponential => event.rebase_start(time, value),
                EventKind::Target { .. } => event.start_value = value,
                EventKind::Set | EventKind::Curve { .. } => {}
            }
        }
    }

    /// Position for an event that starts or ends at `time`: after everything
    /// starting earlier and after instants at `time`.
    fn insertion_index(&self, time: f64) -> usize {
        self.events.partition_point(|event| {
            event.start_time < time || (event.start_time == time && event.is_instant())
        })
    }

    /// Mirrored calls a cancel-and-hold costs on this sink.
    fn hold_calls(&self) -> usize {
        if self.sink.supports_cancel_and_hold() {
            1
        } else {
            2
        }
    }

    /// Fails when the sink cannot take `calls` more calls, before anything
    /// is mirrored or committed.
    fn reserve(&self, calls: usize) -> Result<(), TimelineError> {
        match self.sink.free_slots() {
            Some(free) if free < calls => {
                tracing::warn!(param = %self.spec.name, needed = calls, free, "sink is full");
                Err(TimelineError::SinkFull {
                    needed: calls,
                    free,
                })
            }
            _ => Ok(()),
        }
    }

    fn before_mut(&mut self, index: usize) -> Option<&mut AutomationEvent> {
        let prev = index.checked_sub(1)?;
        self.events.get_mut(prev)
    }

    /// Index of the last event starting at or before `time`.
    fn in_force(&self, time: f64) -> Option<usize> {
        self.events
            .partition_point(|event| event.start_time <= time)
            .checked_sub(1)
    }

    fn convert(&self, value: ParamValue) -> Result<f64, TimelineError> {
        let raw = self.converter.convert(self.spec.unit, &value)?;
        self.spec.check(raw)
    }
}

impl<S, C> fmt::Debug for Timeline<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("spec", &self.spec)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
