//! Sequential reader for the trace format.

pub mod event;
pub mod parse;

pub use event::{InfoEvent, Trace, TraceEvent, TraceSummary};
pub use parse::{parse_trace_file, parse_trace_str};
