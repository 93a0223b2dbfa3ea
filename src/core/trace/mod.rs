pub mod recorder;

pub use recorder::{EventTraceRecorder, Stage, StageEvent, TraceRecord};
