//! The trace writer.
//!
//! Every call appends exactly one instruction line, optionally followed by one
//! content block, straight to the sink. Nothing is reordered or held back.

use crate::addr::{DedupKey, EdgeAddr, NodeAddr, Subject};
use crate::config::{DedupScope, EmitConfig, Qualify};
use crate::emit::dedup::DedupCache;
use crate::emit::frame::{self, Args, Op, SENTINEL};

use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Per-session instruction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub instructions: u64,
    pub nodes: u64,
    pub edges: u64,
    pub declares: u64,
    pub references: u64,
}

pub struct TraceEmitter<W: Write> {
    pub(super) out: W,
    pub(super) config: EmitConfig,
    pub(super) group: Option<String>,
    pub(super) cache: DedupCache,
    pub(super) stats: EmitStats,
}

impl TraceEmitter<BufWriter<File>> {
    /// Open (truncate) `path` for writing.
    pub fn create<P: AsRef<Path>>(path: P, config: EmitConfig) -> crate::Result<Self> {
        let path = path.as_ref();
        let f = File::create(path)
            .with_context(|| format!("create trace file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(f), config))
    }
}

impl<W: Write> TraceEmitter<W> {
    pub fn new(out: W, config: EmitConfig) -> Self {
        Self {
            out,
            config,
            group: None,
            cache: DedupCache::default(),
            stats: EmitStats::default(),
        }
    }

    pub fn current_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn stats(&self) -> EmitStats {
        self.stats
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    /// Resolve `id` to its qualified address under the configured rule.
    pub fn node_addr(&self, id: &str, group: Option<&str>) -> NodeAddr {
        let explicit = group.filter(|g| !g.is_empty());
        match (explicit, self.config.qualify) {
            (Some(g), _) => NodeAddr::new(id, Some(g)),
            (None, Qualify::Current) => NodeAddr::new(id, self.current_group()),
            (None, Qualify::Explicit) => NodeAddr::new(id, None),
        }
    }

    pub fn edge_addr(
        &self,
        src: &str,
        dst: &str,
        src_group: Option<&str>,
        dst_group: Option<&str>,
    ) -> EdgeAddr {
        EdgeAddr::new(self.node_addr(src, src_group), self.node_addr(dst, dst_group))
    }

    pub fn select_group(&mut self, group: &str) -> io::Result<()> {
        if self.config.dedup == DedupScope::Group {
            self.cache.clear();
        }
        self.group = Some(group.to_string());
        self.write_instruction(Op::SelectGroup, Args::new().push(group), None)
    }

    pub fn add_node(
        &mut self,
        id: &str,
        group: Option<&str>,
        content: Option<&str>,
    ) -> io::Result<()> {
        let addr = self.node_addr(id, group);
        let content = content.map(|c| self.config.content.normalize(c));
        self.write_instruction(Op::Node, Args::new().push(addr.as_str()), content.as_deref())?;
        self.stats.nodes += 1;
        Ok(())
    }

    pub fn add_edge(
        &mut self,
        src: &str,
        dst: &str,
        src_group: Option<&str>,
        dst_group: Option<&str>,
    ) -> io::Result<()> {
        let edge = self.edge_addr(src, dst, src_group, dst_group);
        let args = Args::new().push(edge.src.as_str()).push(edge.dst.as_str());
        self.write_instruction(Op::Edge, args, None)?;
        self.stats.edges += 1;
        Ok(())
    }

    pub fn add_node_info(
        &mut self,
        id: &str,
        payload: &str,
        group: Option<&str>,
        tag: Option<&str>,
    ) -> io::Result<()> {
        let addr = self.node_addr(id, group);
        self.declare(Subject::Node(addr), tag, payload)
    }

    pub fn add_edge_info(
        &mut self,
        src: &str,
        dst: &str,
        payload: &str,
        src_group: Option<&str>,
        dst_group: Option<&str>,
        tag: Option<&str>,
    ) -> io::Result<()> {
        let edge = self.edge_addr(src, dst, src_group, dst_group);
        self.declare(Subject::Edge(edge), tag, payload)
    }

    pub fn add_global_info(&mut self, payload: &str, tag: Option<&str>) -> io::Result<()> {
        self.declare(Subject::Global, tag, payload)
    }

    pub fn add_prev_node_info(
        &mut self,
        id: &str,
        group: Option<&str>,
        tag: Option<&str>,
    ) -> io::Result<()> {
        let addr = self.node_addr(id, group);
        self.reference(&Subject::Node(addr), tag)
    }

    pub fn add_prev_edge_info(
        &mut self,
        src: &str,
        dst: &str,
        src_group: Option<&str>,
        dst_group: Option<&str>,
        tag: Option<&str>,
    ) -> io::Result<()> {
        let edge = self.edge_addr(src, dst, src_group, dst_group);
        self.reference(&Subject::Edge(edge), tag)
    }

    pub fn add_prev_global_info(&mut self, tag: Option<&str>) -> io::Result<()> {
        self.reference(&Subject::Global, tag)
    }

    /// Write a `*info` block and make `payload` the active value of its slot.
    pub(super) fn declare(
        &mut self,
        subject: Subject,
        tag: Option<&str>,
        payload: &str,
    ) -> io::Result<()> {
        let payload = self.config.content.normalize(payload);
        let (op, args) = match &subject {
            Subject::Node(addr) => (Op::NodeInfo, Args::new().push(addr.as_str())),
            Subject::Edge(e) => (
                Op::EdgeInfo,
                Args::new().push(e.src.as_str()).push(e.dst.as_str()),
            ),
            Subject::Global => (Op::GlobalInfo, Args::new()),
        };
        self.write_instruction(op, args.push_opt(tag), Some(&payload))?;
        self.stats.declares += 1;
        self.cache.insert(DedupKey::new(subject, tag), payload);
        Ok(())
    }

    /// Write a `prev*info` back-reference. The cache is left untouched.
    pub(super) fn reference(&mut self, subject: &Subject, tag: Option<&str>) -> io::Result<()> {
        let (op, args) = match subject {
            Subject::Node(addr) => (Op::PrevNodeInfo, Args::new().push(addr.as_str())),
            Subject::Edge(e) => (
                Op::PrevEdgeInfo,
                Args::new().push(e.src.as_str()).push(e.dst.as_str()),
            ),
            Subject::Global => (Op::PrevGlobalInfo, Args::new()),
        };
        self.write_instruction(op, args.push_opt(tag), None)?;
        self.stats.references += 1;
        Ok(())
    }

    /// Write one header line and, if non-empty, its body.
    pub fn write_instruction(
        &mut self,
        op: Op,
        args: Args<'_>,
        body: Option<&str>,
    ) -> io::Result<()> {
        if let Some(bad) = args.as_slice().iter().find(|a| a.contains(char::is_whitespace)) {
            tracing::warn!(
                "{} argument {:?} contains whitespace; consumers will mis-split it",
                op.keyword(),
                bad
            );
        }
        writeln!(self.out, "{}", frame::header(op, &args))?;
        self.stats.instructions += 1;

        if let Some(body) = body.filter(|b| !b.is_empty()) {
            if body.lines().any(|l| l.starts_with(SENTINEL)) {
                tracing::warn!(
                    "{} body has a line starting with {:?}; it will be read as an instruction",
                    op.keyword(),
                    SENTINEL
                );
            }
            writeln!(self.out, "{}", body.trim_end())?;
        }
        Ok(())
    }
}
