use crate::addr::{EdgeAddr, NodeAddr, Subject};
use serde::Serialize;
use std::collections::BTreeSet;

/// One instruction as read back from a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    SelectGroup(String),
    Node {
        addr: NodeAddr,
        content: Option<String>,
    },
    Edge(EdgeAddr),
    Info(InfoEvent),
}

/// A declared or referenced fact, with the payload resolved either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEvent {
    pub line: usize,
    pub subject: Subject,
    pub tag: Option<String>,
    pub payload: String,
    pub referenced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub groups: Vec<String>,
    pub nodes: usize,
    pub edges: usize,
    pub declared: usize,
    pub referenced: usize,
}

impl Trace {
    pub fn infos(&self) -> impl Iterator<Item = &InfoEvent> {
        self.events.iter().filter_map(|e| match e {
            TraceEvent::Info(info) => Some(info),
            _ => None,
        })
    }

    pub fn summary(&self) -> TraceSummary {
        let mut groups = Vec::new();
        let mut nodes = BTreeSet::new();
        let mut edges = BTreeSet::new();
        let mut summary = TraceSummary::default();

        for event in &self.events {
            match event {
                TraceEvent::SelectGroup(g) => {
                    if !groups.contains(g) {
                        groups.push(g.clone());
                    }
                }
                TraceEvent::Node { addr, .. } => {
                    nodes.insert(addr);
                }
                TraceEvent::Edge(e) => {
                    edges.insert(e);
                }
                TraceEvent::Info(info) if info.referenced => summary.referenced += 1,
                TraceEvent::Info(_) => summary.declared += 1,
            }
        }

        summary.groups = groups;
        summary.nodes = nodes.len();
        summary.edges = edges.len();
        summary
    }
}
