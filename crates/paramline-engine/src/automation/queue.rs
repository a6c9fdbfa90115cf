//! Hands mirrored scheduling calls to an audio thread without locking.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF64;
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

use super::sink::{ParamSink, SinkCall};

/// Creates a queue-backed sink and the receiver the audio thread drains.
/// `initial` seeds the value reported back to the timeline.
pub fn sink_queue(capacity: usize, initial: f64) -> (QueueSink, SinkReceiver) {
    let ring = HeapRb::new(capacity.max(1));
    let (producer, consumer) = ring.split();
    let observed = Arc::new(AtomicF64::new(initial));
    (
        QueueSink {
            producer,
            observed: Arc::clone(&observed),
            native_hold: false,
            dropped: 0,
        },
        SinkReceiver { consumer, observed },
    )
}

/// Control-thread side: every scheduling call becomes a [`SinkCall`] pushed
/// into a single-producer ring buffer.
pub struct QueueSink {
    producer: HeapProducer<SinkCall>,
    observed: Arc<AtomicF64>,
    native_hold: bool,
    dropped: usize,
}

impl QueueSink {
    /// Forward cancel-and-hold as one call instead of cancel + set. Only
    /// useful when the receiving sink supports it natively.
    pub fn with_native_hold(mut self) -> Self {
        self.native_hold = true;
        self
    }

    /// Calls lost because the queue was full. A [`Timeline`](super::Timeline)
    /// checks [`ParamSink::free_slots`] first, so only direct pushes can land here.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Queues `call`, handing it back when the ring is full.
    pub fn send(&mut self, call: SinkCall) -> Result<(), SinkCall> {
        self.producer.push(call)
    }

    fn push(&mut self, call: SinkCall) {
        if let Err(call) = self.send(call) {
            self.dropped += 1;
            tracing::warn!(?call, dropped = self.dropped, "automation queue full, dropping call");
        }
    }
}

impl ParamSink for QueueSink {
    fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.push(SinkCall::SetValue { value, time });
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.push(SinkCall::LinearRamp { value, time });
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64) {
        self.push(SinkCall::ExponentialRamp { value, time });
    }

    fn set_target_at_time(&mut self, target: f64, start_time: f64, time_constant: f64) {
        self.push(SinkCall::SetTarget {
            target,
            start_time,
            time_constant,
        });
    }

    fn set_value_curve_at_time(&mut self, values: &[f64], start_time: f64, duration: f64) {
        self.push(SinkCall::SetValueCurve {
            values: values.to_vec(),
            start_time,
            duration,
        });
    }

    fn cancel_scheduled_values(&mut self, time: f64) {
        self.push(SinkCall::CancelScheduledValues { time });
    }

    fn supports_cancel_and_hold(&self) -> bool {
        self.native_hold
    }

    fn cancel_and_hold_at_time(&mut self, time: f64) {
        self.push(SinkCall::CancelAndHold { time });
    }

    fn free_slots(&self) -> Option<usize> {
        Some(self.producer.free_len())
    }

    fn value(&self) -> Option<f64> {
        Some(self.observed.load(Ordering::Acquire))
    }
}

/// Audio-thread side of [`sink_queue`].
pub struct SinkReceiver {
    consumer: HeapConsumer<SinkCall>,
    observed: Arc<AtomicF64>,
}

impl SinkReceiver {
    #[inline]
    pub fn try_recv(&mut self) -> Option<SinkCall> {
        self.consumer.pop()
    }

    /// Replays every pending call onto `sink`, returning how many were applied.
    pub fn drain_into<S: ParamSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let mut applied = 0;
        while let Some(call) = self.consumer.pop() {
            call.apply_to(sink);
            applied += 1;
        }
        if let Some(value) = sink.value() {
            self.publish_value(value);
        }
        applied
    }

    /// Reports the value the engine is actually producing back to the
    /// control side.
    #[inline]
    pub fn publish_value(&self, value: f64) {
        self.observed.store(value, Ordering::Release);
    }
}
