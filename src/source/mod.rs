//! Analysis sources and the driver that turns them into traces.
//!
//! The emitter knows nothing about analyzers. Anything implementing
//! `AnalysisSource` can be driven; `json` provides the file-backed one.

pub mod drive;
pub mod graph;
pub mod json;

pub use drive::{CALL_GRAPH_GROUP, emit_analysis};
pub use graph::{AnalysisSource, CallSite, Fact, FunctionGraph, GraphEdge, GraphNode};
pub use json::{Analysis, AnalysisSpec, load_analysis};
