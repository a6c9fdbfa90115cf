//! Shared utilities for the Paramline workspace.

pub mod db;
pub mod pitch;
pub mod profiling;
pub mod time;

pub use pitch::{EqualTemperament, PitchError, PitchResolver, PitchTable};
pub use time::{Clock, ManualClock, MonotonicClock};

/// Convenience type alias for positions on a timeline, in seconds.
pub type Seconds = f64;

/// Convenience type alias for values expressed in decibels.
pub type Decibels = f64;
