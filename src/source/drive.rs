//! Walk an `AnalysisSource` into a trace.
//!
//! Per function: `selectgroup`, every node, every edge, then node facts and
//! edge facts through the declare-or-reference driver. Global facts follow,
//! then the call graph (if any) as its own group.

use crate::Result;
use crate::emit::{Recorded, TraceEmitter};
use crate::source::graph::{AnalysisSource, FunctionGraph};

use anyhow::{Context, bail};
use std::io::Write;

/// Group holding one node per function and the caller -> callee edges.
pub const CALL_GRAPH_GROUP: &str = "CallGraph";

pub fn emit_analysis<S, W>(source: &S, emitter: &mut TraceEmitter<W>) -> Result<()>
where
    S: AnalysisSource + ?Sized,
    W: Write,
{
    if !source.calls().is_empty() && source.functions().iter().any(|f| f.name == CALL_GRAPH_GROUP) {
        bail!(
            "function {} collides with the call graph group",
            CALL_GRAPH_GROUP
        );
    }

    for function in source.functions() {
        emit_function(function, emitter)
            .with_context(|| format!("emit function {}", function.name))?;
    }

    for fact in source.global_facts() {
        emitter
            .record_global_info(&fact.payload, fact.tag.as_deref())
            .context("emit global facts")?;
    }

    if !source.calls().is_empty() {
        emit_call_graph(source, emitter).context("emit call graph")?;
    }

    let stats = emitter.stats();
    tracing::info!(
        functions = source.functions().len(),
        instructions = stats.instructions,
        declares = stats.declares,
        references = stats.references,
        "trace emitted"
    );
    Ok(())
}

fn emit_function<W: Write>(f: &FunctionGraph, emitter: &mut TraceEmitter<W>) -> Result<()> {
    let group = Some(f.name.as_str());
    emitter.select_group(&f.name)?;

    for node in &f.nodes {
        emitter.add_node(&node.id, group, node.text.as_deref())?;
    }
    for edge in &f.edges {
        emitter.add_edge(&edge.src, &edge.dst, group, group)?;
    }

    let mut referenced = 0usize;
    for node in &f.nodes {
        for fact in &node.facts {
            let r = emitter.record_node_info(&node.id, &fact.payload, group, fact.tag.as_deref())?;
            referenced += usize::from(r == Recorded::Referenced);
        }
    }
    for edge in &f.edges {
        for fact in &edge.facts {
            let r = emitter.record_edge_info(
                &edge.src,
                &edge.dst,
                &fact.payload,
                group,
                group,
                fact.tag.as_deref(),
            )?;
            referenced += usize::from(r == Recorded::Referenced);
        }
    }

    tracing::debug!(
        group = %f.name,
        nodes = f.nodes.len(),
        edges = f.edges.len(),
        referenced,
        "emitted function"
    );
    Ok(())
}

fn emit_call_graph<S, W>(source: &S, emitter: &mut TraceEmitter<W>) -> Result<()>
where
    S: AnalysisSource + ?Sized,
    W: Write,
{
    let cg = Some(CALL_GRAPH_GROUP);
    emitter.select_group(CALL_GRAPH_GROUP)?;
    for f in source.functions() {
        emitter.add_node(&f.name, cg, Some(&format!("Function: {}", f.name)))?;
    }

    for call in source.calls() {
        emitter.add_edge(&call.caller, &call.callee, cg, cg)?;
    }

    // Interprocedural edges from the calling node to the callee's entry.
    for call in source.calls() {
        let Some(site) = &call.site else { continue };
        let entry = source
            .functions()
            .iter()
            .find(|f| f.name == call.callee)
            .and_then(FunctionGraph::entry);
        match entry {
            Some(entry) => emitter.add_edge(site, &entry.id, Some(&call.caller), Some(&call.callee))?,
            None => tracing::warn!(
                caller = %call.caller,
                callee = %call.callee,
                "call site has no callee entry node; skipped"
            ),
        }
    }
    Ok(())
}
