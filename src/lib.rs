//! Writer (and reader) for a line-oriented dataflow trace format.
//!
//! A trace is a sequence of `>>`-prefixed instructions declaring graph nodes,
//! edges, and analysis facts attached to them. Facts that repeat can be sent
//! as `prev*` back-references instead of being re-transmitted.

pub mod addr;
pub mod config;
pub mod demo;
pub mod emit;
pub mod source;
pub mod trace;

pub type Result<T> = anyhow::Result<T>;
