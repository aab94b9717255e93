//! Analysis document (analysis.json) produced by an external analyzer.
//!
//! JSON shape:
//! {
//!   "functions": [
//!     {
//!       "name": "transfer",                      // becomes the group
//!       "nodes": [
//!         { "id": "BB0", "text": "x = 1",         // text is optional
//!           "facts": { "": {"x": "[0,1]"} } }     // tag -> payload, "" = untagged
//!       ],
//!       "edges": [ { "src": "BB0", "dst": "BB1", "facts": {} } ]
//!     }
//!   ],
//!   "globals": { "heap": {"x": 1} },
//!   "calls": [ { "caller": "transfer", "callee": "check", "site": "BB0" } ]
//! }
//!
//! Fact values may be any JSON; strings are taken verbatim, everything else is
//! serialized compactly. We validate names and references, then build an
//! `Analysis` that implements `AnalysisSource`.

use crate::Result;
use crate::source::drive::CALL_GRAPH_GROUP;
use crate::source::graph::{AnalysisSource, CallSite, Fact, FunctionGraph, GraphEdge, GraphNode};

use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSpec {
    #[serde(default)]
    pub functions: Vec<RawFunction>,

    #[serde(default)]
    pub globals: BTreeMap<String, Value>,

    #[serde(default)]
    pub calls: Vec<RawCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFunction {
    pub name: String,

    #[serde(default)]
    pub nodes: Vec<RawNode>,

    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: String,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub facts: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    pub src: String,
    pub dst: String,

    #[serde(default)]
    pub facts: BTreeMap<String, Value>,
}

/// Call relations in analysis.json.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCall {
    // Short shape: ["caller", "callee"]
    Pair([String; 2]),
    // { "caller": ..., "callee": ..., "site": ... }
    Explicit {
        caller: String,
        callee: String,
        #[serde(default)]
        site: Option<String>,
    },
}

/// Validated analysis, ready to drive an emitter.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub functions: Vec<FunctionGraph>,
    pub globals: Vec<Fact>,
    pub calls: Vec<CallSite>,
}

impl AnalysisSource for Analysis {
    fn functions(&self) -> &[FunctionGraph] {
        &self.functions
    }

    fn global_facts(&self) -> &[Fact] {
        &self.globals
    }

    fn calls(&self) -> &[CallSite] {
        &self.calls
    }
}

/// Load and validate an analysis document.
pub fn load_analysis(path: &str) -> Result<Analysis> {
    let text = fs::read_to_string(path).with_context(|| format!("read analysis file {}", path))?;
    let spec: AnalysisSpec =
        serde_json::from_str(&text).with_context(|| format!("parse analysis file {}", path))?;
    spec.validate_and_build()
        .with_context(|| format!("validate analysis file {}", path))
}

impl AnalysisSpec {
    /// Check names and references, then convert facts to payload strings.
    ///
    /// - function names are non-empty, unique, free of ':' and whitespace, and
    ///   not the call graph group
    /// - node ids are unique within their function
    /// - edges and call sites reference existing nodes, calls existing functions
    pub fn validate_and_build(&self) -> Result<Analysis> {
        let mut functions = Vec::with_capacity(self.functions.len());
        let mut names = BTreeSet::new();

        for raw in &self.functions {
            check_token("function name", &raw.name)?;
            if raw.name.contains(':') {
                bail!("function name {:?} must not contain ':'", raw.name);
            }
            if raw.name == CALL_GRAPH_GROUP {
                bail!("function name {} is reserved for the call graph", raw.name);
            }
            if !names.insert(raw.name.as_str()) {
                bail!("duplicate function name in analysis.json: {}", raw.name);
            }
            functions.push(build_function(raw)?);
        }

        let globals = facts_of(&self.globals).context("globals")?;

        let mut calls = Vec::with_capacity(self.calls.len());
        for raw in &self.calls {
            let call = match raw {
                RawCall::Pair([caller, callee]) => CallSite {
                    caller: caller.clone(),
                    callee: callee.clone(),
                    site: None,
                },
                RawCall::Explicit {
                    caller,
                    callee,
                    site,
                } => CallSite {
                    caller: caller.clone(),
                    callee: callee.clone(),
                    site: site.clone(),
                },
            };

            let caller = match functions.iter().find(|f| f.name == call.caller) {
                Some(f) => f,
                None => bail!("call references unknown caller function: {}", call.caller),
            };
            let callee = match functions.iter().find(|f| f.name == call.callee) {
                Some(f) => f,
                None => bail!("call references unknown callee function: {}", call.callee),
            };
            if let Some(site) = &call.site {
                if caller.node(site).is_none() {
                    bail!("call site {} is not a node of {}", site, caller.name);
                }
                if callee.entry().is_none() {
                    bail!("call site {} targets {} which has no nodes", site, callee.name);
                }
            }
            calls.push(call);
        }

        Ok(Analysis {
            functions,
            globals,
            calls,
        })
    }
}

fn build_function(raw: &RawFunction) -> Result<FunctionGraph> {
    let mut ids = BTreeSet::new();
    let mut nodes = Vec::with_capacity(raw.nodes.len());
    for n in &raw.nodes {
        check_token("node id", &n.id)?;
        if !ids.insert(n.id.as_str()) {
            bail!("duplicate node id in function {}: {}", raw.name, n.id);
        }
        nodes.push(GraphNode {
            id: n.id.clone(),
            text: n.text.clone(),
            facts: facts_of(&n.facts)
                .with_context(|| format!("facts of node {}:{}", raw.name, n.id))?,
        });
    }

    let mut edges = Vec::with_capacity(raw.edges.len());
    for e in &raw.edges {
        for end in [&e.src, &e.dst] {
            if !ids.contains(end.as_str()) {
                bail!(
                    "edge {} -> {} in function {} references unknown node {}",
                    e.src,
                    e.dst,
                    raw.name,
                    end
                );
            }
        }
        edges.push(GraphEdge {
            src: e.src.clone(),
            dst: e.dst.clone(),
            facts: facts_of(&e.facts)
                .with_context(|| format!("facts of edge {}:{} -> {}", raw.name, e.src, e.dst))?,
        });
    }

    Ok(FunctionGraph {
        name: raw.name.clone(),
        nodes,
        edges,
    })
}

fn facts_of(raw: &BTreeMap<String, Value>) -> Result<Vec<Fact>> {
    let mut out = Vec::with_capacity(raw.len());
    for (tag, value) in raw {
        if !tag.is_empty() {
            check_token("fact tag", tag)?;
        }
        let payload = match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other)?,
        };
        out.push(Fact {
            tag: (!tag.is_empty()).then(|| tag.clone()),
            payload,
        });
    }
    Ok(out)
}

fn check_token(what: &str, s: &str) -> Result<()> {
    if s.is_empty() {
        bail!("{} must not be empty", what);
    }
    if s.contains(char::is_whitespace) {
        bail!("{} {:?} must not contain whitespace", what, s);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(json: &str) -> Result<Analysis> {
        let spec: AnalysisSpec = serde_json::from_str(json)?;
        spec.validate_and_build()
    }

    #[test]
    fn builds_functions_and_facts() {
        let a = build(
            r#"{
              "functions": [{
                "name": "f",
                "nodes": [
                  {"id": "BB0", "text": "x = 1", "facts": {"": {"x": "[0,1]"}, "out": "raw"}},
                  {"id": "BB1"}
                ],
                "edges": [{"src": "BB0", "dst": "BB1"}]
              }],
              "globals": {"heap": {"x": 1}}
            }"#,
        )
        .unwrap();

        let f = &a.functions()[0];
        assert_eq!(f.name, "f");
        assert_eq!(
            f.nodes[0].facts,
            vec![
                Fact {
                    tag: None,
                    payload: r#"{"x":"[0,1]"}"#.to_string(),
                },
                Fact {
                    tag: Some("out".to_string()),
                    payload: "raw".to_string(),
                },
            ]
        );
        assert_eq!(f.nodes[1].text, None);
        assert_eq!(f.edges.len(), 1);
        assert_eq!(a.global_facts()[0].payload, r#"{"x":1}"#);
    }

    #[test]
    fn accepts_both_call_shapes() {
        let a = build(
            r#"{
              "functions": [{"name": "f", "nodes": [{"id": "a"}]}, {"name": "g", "nodes": [{"id": "b"}]}],
              "calls": [["f", "g"], {"caller": "f", "callee": "g", "site": "a"}]
            }"#,
        )
        .unwrap();
        assert_eq!(a.calls()[0].site, None);
        assert_eq!(a.calls()[1].site.as_deref(), Some("a"));
    }

    #[test]
    fn rejects_bad_input() {
        let cases = [
            (r#"{"functions": [{"name": "f"}, {"name": "f"}]}"#, "duplicate function name"),
            (r#"{"functions": [{"name": "a:b"}]}"#, "must not contain ':'"),
            (
                r#"{"functions": [{"name": "CallGraph", "nodes": [{"id": "f", "text": "x = 1"}]}, {"name": "f", "nodes": [{"id": "a"}]}], "calls": [["f", "CallGraph"]]}"#,
                "reserved for the call graph",
            ),
            (r#"{"functions": [{"name": ""}]}"#, "must not be empty"),
            (
                r#"{"functions": [{"name": "f", "nodes": [{"id": "x"}, {"id": "x"}]}]}"#,
                "duplicate node id",
            ),
            (
                r#"{"functions": [{"name": "f", "nodes": [{"id": "bad id"}]}]}"#,
                "must not contain whitespace",
            ),
            (
                r#"{"functions": [{"name": "f", "nodes": [{"id": "x"}], "edges": [{"src": "x", "dst": "y"}]}]}"#,
                "unknown node y",
            ),
            (r#"{"functions": [{"name": "f"}], "calls": [["f", "g"]]}"#, "unknown callee"),
            (
                r#"{"functions": [{"name": "f", "nodes": [{"id": "a"}]}, {"name": "g"}], "calls": [{"caller": "f", "callee": "g", "site": "a"}]}"#,
                "has no nodes",
            ),
            (r#"{"globals": {"two words": 1}}"#, "must not contain whitespace"),
        ];
        for (json, want) in cases {
            let err = format!("{:#}", build(json).unwrap_err());
            assert!(err.contains(want), "{} -> {}", json, err);
        }
    }
}
