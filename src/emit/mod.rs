//! Trace emission: instruction framing, the writer, and deduplication.

pub mod dedup;
pub mod frame;
pub mod writer;

pub use dedup::{DedupCache, Recorded};
pub use frame::{Op, SENTINEL};
pub use writer::{EmitStats, TraceEmitter};
