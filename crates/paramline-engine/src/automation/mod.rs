pub mod curve;
pub mod event;
pub mod queue;
pub mod sink;
pub mod timeline;

pub use event::{AutomationEvent, EventKind};
pub use queue::{sink_queue, QueueSink, SinkReceiver};
pub use sink::{NullSink, ParamSink, RecordingSink, SinkCall};
pub use timeline::Timeline;
