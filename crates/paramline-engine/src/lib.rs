//! Paramline Engine
//! ================
//! Scheduled-value automation for audio parameters. A [`Timeline`] keeps an
//! ordered list of set, ramp, target and curve events, answers "what is the
//! value at time t", and mirrors every scheduling call onto a host
//! [`ParamSink`] so the real-time engine renders the same trajectory.

pub mod automation;
pub mod config;
pub mod error;
pub mod units;

pub use automation::{
    sink_queue, AutomationEvent, EventKind, NullSink, ParamSink, QueueSink, RecordingSink,
    SinkCall, SinkReceiver, Timeline,
};
pub use config::{load_specs, ParamSpec};
pub use error::TimelineError;
pub use units::{ParamValue, Unit, UnitConverter};

pub use paramline_utils::{Clock, ManualClock, MonotonicClock, PitchResolver};
