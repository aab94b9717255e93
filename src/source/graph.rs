//! In-memory shape of an analyzed program, as the driver consumes it.

/// One payload attached to a subject. `tag == None` is the untagged slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub tag: Option<String>,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    /// Rendered source text shown inside the node.
    pub text: Option<String>,
    pub facts: Vec<Fact>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub src: String,
    pub dst: String,
    pub facts: Vec<Fact>,
}

/// A function's graph; its name becomes the group of every node in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionGraph {
    pub name: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl FunctionGraph {
    pub fn entry(&self) -> Option<&GraphNode> {
        self.nodes.first()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A caller -> callee relation, optionally pinned to the calling node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub caller: String,
    pub callee: String,
    pub site: Option<String>,
}

/// Anything that can hand a program graph to the driver.
pub trait AnalysisSource {
    fn functions(&self) -> &[FunctionGraph];

    fn global_facts(&self) -> &[Fact] {
        &[]
    }

    fn calls(&self) -> &[CallSite] {
        &[]
    }
}
