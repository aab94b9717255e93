//! Addressing for trace subjects.
//!
//! Example: node `BB3` in group `main`  =>  `main:BB3`
//!
//! Addresses are kept in serialized form so equality is string equality and
//! they can key a BTreeMap directly.

use std::fmt;

/// Format a node id, qualified with `group` when the group is non-empty.
pub fn format_addr(id: &str, group: Option<&str>) -> String {
    match group.filter(|g| !g.is_empty()) {
        Some(g) => format!("{}:{}", g, id),
        None => id.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeAddr(String);

impl NodeAddr {
    pub fn new(id: &str, group: Option<&str>) -> Self {
        Self(format_addr(id, group))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl From<&str> for NodeAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeAddr {
    pub src: NodeAddr,
    pub dst: NodeAddr,
}

impl EdgeAddr {
    pub fn new(src: NodeAddr, dst: NodeAddr) -> Self {
        Self { src, dst }
    }
}

impl fmt::Display for EdgeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.src, self.dst)
    }
}

/// What an info record is attached to. `Global` is a graph-wide fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subject {
    Node(NodeAddr),
    Edge(EdgeAddr),
    Global,
}

/// Identifies a fact slot: at most one active payload per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DedupKey {
    pub subject: Subject,
    pub tag: Option<String>,
}

impl DedupKey {
    pub fn new(subject: Subject, tag: Option<&str>) -> Self {
        Self {
            subject,
            tag: tag.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_only_with_non_empty_group() {
        assert_eq!(format_addr("n1", Some("f")), "f:n1");
        assert_eq!(format_addr("n1", None), "n1");
        assert_eq!(format_addr("n1", Some("")), "n1");
    }

    #[test]
    fn equality_follows_serialized_form() {
        assert_eq!(NodeAddr::new("n1", Some("f")), NodeAddr::from("f:n1"));
        assert_ne!(NodeAddr::new("n1", Some("f")), NodeAddr::new("n1", Some("g")));
    }


    #[test]
    fn empty_tag_is_no_tag() {
        assert_eq!(
            DedupKey::new(Subject::Global, Some("")),
            DedupKey::new(Subject::Global, None)
        );
    }
}
