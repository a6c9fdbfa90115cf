use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Host-side numeric parameter a [`Timeline`](super::Timeline) mirrors its
/// scheduling onto, one call per mutation and in the same order.
pub trait ParamSink {
    fn set_value_at_time(&mut self, value: f64, time: f64);

    fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64);

    fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64);

    fn set_target_at_time(&mut self, target: f64, start_time: f64, time_constant: f64);

    fn set_value_curve_at_time(&mut self, values: &[f64], start_time: f64, duration: f64);

    fn cancel_scheduled_values(&mut self, time: f64);

    /// Whether [`ParamSink::cancel_and_hold_at_time`] is implemented natively.
    /// When it is not, the timeline sends a cancel followed by a set.
    fn supports_cancel_and_hold(&self) -> bool {
        false
    }

    fn cancel_and_hold_at_time(&mut self, time: f64) {
        let _ = time;
    }

    /// How many more calls the sink can accept right now, or `None` when it
    /// never refuses one. The timeline checks this before committing.
    fn free_slots(&self) -> Option<usize> {
        None
    }

    /// Last raw value the host observed, if it knows one.
    fn value(&self) -> Option<f64>;
}

/// One mirrored scheduling call, as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SinkCall {
    SetValue {
        value: f64,
        time: f64,
    },
    LinearRamp {
        value: f64,
        time: f64,
    },
    ExponentialRamp {
        value: f64,
        time: f64,
    },
    SetTarget {
        target: f64,
        start_time: f64,
        time_constant: f64,
    },
    SetValueCurve {
        values: Vec<f64>,
        start_time: f64,
        duration: f64,
    },
    CancelScheduledValues {
        time: f64,
    },
    CancelAndHold {
        time: f64,
    },
}

impl SinkCall {
    /// Replays the call onto a sink. A cancel-and-hold sent to a sink
    /// without native support degrades to a plain cancel.
    pub fn apply_to<S: ParamSink + ?Sized>(&self, sink: &mut S) {
        match self {
            SinkCall::SetValue { value, time } => sink.set_value_at_time(*value, *time),
            SinkCall::LinearRamp { value, time } => {
                sink.linear_ramp_to_value_at_time(*value, *time)
            }
            SinkCall::ExponentialRamp { value, time } => {
                sink.exponential_ramp_to_value_at_time(*value, *time)
            }
            SinkCall::SetTarget {
                target,
                start_time,
                time_constant,
            } => sink.set_target_at_time(*target, *start_time, *time_constant),
            SinkCall::SetValueCurve {
                values,
                start_time,
                duration,
            } => sink.set_value_curve_at_time(values, *start_time, *duration),
            SinkCall::CancelScheduledValues { time } => sink.cancel_scheduled_values(*time),
            SinkCall::CancelAndHold { time } => {
                if sink.supports_cancel_and_hold() {
                    sink.cancel_and_hold_at_time(*time);
                } else {
                    sink.cancel_scheduled_values(*time);
                }
            }
        }
    }
}

/// Sink that drops every call. Useful when only the logical timeline matters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NullSink {
    value: Option<f64>,
}

impl NullSink {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn with_value(value: f64) -> Self {
        Self { value: Some(value) }
    }
}

impl ParamSink for NullSink {
    fn set_value_at_time(&mut self, _value: f64, _time: f64) {}

    fn linear_ramp_to_value_at_time(&mut self, _value: f64, _time: f64) {}

    fn exponential_ramp_to_value_at_time(&mut self, _value: f64, _time: f64) {}

    fn set_target_at_time(&mut self, _target: f64, _start_time: f64, _time_constant: f64) {}

    fn set_value_curve_at_time(&mut self, _values: &[f64], _start_time: f64, _duration: f64) {}

    fn cancel_scheduled_values(&mut self, _time: f64) {}

    fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Sink that records every call it receives, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
    value: Option<f64>,
    native_hold: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Report native cancel-and-hold support.
    pub fn with_native_hold(mut self) -> Self {
        self.native_hold = true;
        self
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn set_observed_value(&mut self, value: f64) {
        self.value = Some(value);
    }
}

impl ParamSink for RecordingSink {
    fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.calls.push(SinkCall::SetValue { value, time });
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.calls.push(SinkCall::LinearRamp { value, time });
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.calls.push(SinkCall::ExponentialRamp { value, time });
    }

    fn set_target_at_time(&mut self, target: f64, start_time: f64, time_constant: f64) {
        self.calls.push(SinkCall::SetTarget {
            target,
            start_time,
            time_constant,
        });
    }

    fn set_value_curve_at_time(&mut self, values: &[f64], start_time: f64, duration: f64) {
        self.calls.push(SinkCall::SetValueCurve {
            values: values.to_vec(),
            start_time,
            duration,
        });
    }

    fn cancel_scheduled_values(&mut self, time: f64) {
        self.calls.push(SinkCall::CancelScheduledValues { time });
    }

    fn supports_cancel_and_hold(&self) -> bool {
        self.native_hold
    }

    fn cancel_and_hold_at_time(&mut self, time: f64) {
        self.calls.push(SinkCall::CancelAndHold { time });
    }

    fn value(&self) -> Option<f64> {
        self.value
    }
}

macro_rules! forward_sink {
    (@deref $s:ident) => {
        (**$s)
    };
    (@lock $s:ident) => {
        $s.lock()
    };
    ($via:ident) => {
        fn set_value_at_time(&mut self, value: f64, time: f64) {
            forward_sink!(@$via self).set_value_at_time(value, time)
        }

        fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
            forward_sink!(@$via self).linear_ramp_to_value_at_time(value, time)
        }

        fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
            forward_sink!(@$via self).exponential_ramp_to_value_at_time(value, time)
        }

        fn set_target_at_time(&mut self, target: f64, start_time: f64, time_constant: f64) {
            forward_sink!(@$via self).set_target_at_time(target, start_time, time_constant)
        }

        fn set_value_curve_at_time(&mut self, values: &[f64], start_time: f64, duration: f64) {
            forward_sink!(@$via self).set_value_curve_at_time(values, start_time, duration)
        }

        fn cancel_scheduled_values(&mut self, time: f64) {
            forward_sink!(@$via self).cancel_scheduled_values(time)
        }

        fn supports_cancel_and_hold(&self) -> bool {
            forward_sink!(@$via self).supports_cancel_and_hold()
        }

        fn cancel_and_hold_at_time(&mut self, time: f64) {
            forward_sink!(@$via self).cancel_and_hold_at_time(time)
        }

        fn free_slots(&self) -> Option<usize> {
            forward_sink!(@$via self).free_slots()
        }

        fn value(&self) -> Option<f64> {
            forward_sink!(@$via self).value()
        }
    };
}

impl<S: ParamSink + ?Sized> ParamSink for &mut S {
    forward_sink!(deref);
}

impl<S: ParamSink + ?Sized> ParamSink for Box<S> {
    forward_sink!(deref);
}

/// Shared handle: the host keeps its own clone and the timeline drives the
/// same parameter through the lock.
impl<S: ParamSink + ?Sized> ParamSink for Arc<Mutex<S>> {
    forward_sink!(lock);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_call_order() {
        let mut sink = RecordingSink::new().with_value(0.5);
        sink.set_value_at_time(1.0, 0.0);
        sink.linear_ramp_to_value_at_time(2.0, 1.0);
        sink.cancel_scheduled_values(0.5);
        assert_eq!(sink.value(), Some(0.5));
        assert_eq!(
            sink.take_calls(),
            vec![
                SinkCall::SetValue {
                    value: 1.0,
                    time: 0.0
                },
                SinkCall::LinearRamp {
                    value: 2.0,
                    time: 1.0
                },
                SinkCall::CancelScheduledValues { time: 0.5 },
            ]
        );
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn shared_handle_forwards_to_inner_sink() {
        let shared = Arc::new(Mutex::new(RecordingSink::new().with_native_hold()));
        let mut handle = Arc::clone(&shared);
        handle.set_target_at_time(1.0, 0.0, 0.25);
        assert!(handle.supports_cancel_and_hold());
        handle.cancel_and_hold_at_time(2.0);
        assert_eq!(shared.lock().calls().len(), 2);
    }

    #[test]
    fn replayed_hold_degrades_without_native_support() {
        let mut sink = RecordingSink::new();
        SinkCall::CancelAndHold { time: 1.0 }.apply_to(&mut sink);
        assert_eq!(
            sink.calls(),
            &[SinkCall::CancelScheduledValues { time: 1.0 }]
        );
    }
}
