use crate::Result;
use crate::addr::{DedupKey, EdgeAddr, NodeAddr, Subject};
use crate::emit::{Op, SENTINEL};
use crate::trace::event::{InfoEvent, Trace, TraceEvent};

use anyhow::{Context, anyhow, bail};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;

/// Read a trace file top to bottom, resolving every `prev*` reference.
pub fn parse_trace_file(path: &str) -> Result<Trace> {
    let text = fs::read_to_string(path).with_context(|| format!("read trace file {}", path))?;
    parse_trace_str(&text).with_context(|| format!("parse trace file {}", path))
}

/// Parse trace text.
///
/// A line starting with `>>` opens an instruction; every other line belongs
/// to the body of the instruction above it.
pub fn parse_trace_str(text: &str) -> Result<Trace> {
    // 1) keyword, 2) the rest of the header (whitespace-separated arguments)
    let re = Regex::new(r"^>>(\S*)(.*)$")?;

    let mut reader = Reader::default();
    let mut pending: Option<(usize, &str)> = None;
    let mut body: Vec<&str> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;

        if line.starts_with(SENTINEL) {
            if let Some((hno, header)) = pending.take() {
                reader.apply(&re, hno, header, &body)?;
                body.clear();
            }
            pending = Some((lno, line));
            continue;
        }

        if pending.is_none() {
            if line.trim().is_empty() {
                continue;
            }
            bail!("trace parse error at line {}: content before first instruction: {:?}", lno, line);
        }
        body.push(line);
    }

    if let Some((hno, header)) = pending {
        reader.apply(&re, hno, header, &body)?;
    }

    Ok(Trace {
        events: reader.events,
    })
}

#[derive(Default)]
struct Reader {
    events: Vec<TraceEvent>,
    /// Most recent payload declared into each fact slot.
    latest: HashMap<DedupKey, String>,
    with_content: HashSet<NodeAddr>,
}

impl Reader {
    fn apply(&mut self, re: &Regex, lno: usize, header: &str, body: &[&str]) -> Result<()> {
        let caps = re
            .captures(header)
            .ok_or_else(|| anyhow!("trace parse error at line {}: bad header {:?}", lno, header))?;
        let kw = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str());

        let op = match Op::from_keyword(kw) {
            Some(op) => op,
            None => bail!("unknown instruction {:?} at line {}: {}", kw, lno, header),
        };

        let args: Vec<&str> = rest.split_whitespace().collect();
        let arity = op.address_arity();
        let max = arity + usize::from(op.takes_tag());
        if args.len() < arity || args.len() > max {
            bail!(
                "invalid number of arguments in >>{} at line {}: expected {}, found {}",
                kw,
                lno,
                if arity == max {
                    arity.to_string()
                } else {
                    format!("{} or {}", arity, max)
                },
                args.len()
            );
        }

        let body = body.join("\n");
        let body = body.trim_end();
        if !body.is_empty() && !op.takes_body() {
            bail!(">>{} at line {} does not take a body: {:?}", kw, lno, body);
        }

        let tag = args.get(arity).map(|t| t.to_string());

        match op {
            Op::SelectGroup => self.events.push(TraceEvent::SelectGroup(args[0].to_string())),
            Op::Node => {
                let addr = NodeAddr::from(args[0]);
                let content = (!body.is_empty()).then(|| body.to_string());
                if content.is_some() && !self.with_content.insert(addr.clone()) {
                    bail!(
                        "node {} at line {} is already defined with content",
                        addr,
                        lno
                    );
                }
                self.events.push(TraceEvent::Node { addr, content });
            }
            Op::Edge => self.events.push(TraceEvent::Edge(EdgeAddr::new(
                NodeAddr::from(args[0]),
                NodeAddr::from(args[1]),
            ))),
            Op::NodeInfo | Op::EdgeInfo | Op::GlobalInfo => {
                let subject = subject_of(&args[..arity]);
                let key = DedupKey::new(subject.clone(), tag.as_deref());
                self.latest.insert(key, body.to_string());
                self.events.push(TraceEvent::Info(InfoEvent {
                    line: lno,
                    subject,
                    tag,
                    payload: body.to_string(),
                    referenced: false,
                }));
            }
            Op::PrevNodeInfo | Op::PrevEdgeInfo | Op::PrevGlobalInfo => {
                let subject = subject_of(&args[..arity]);
                let key = DedupKey::new(subject.clone(), tag.as_deref());
                let payload = self.latest.get(&key).cloned().ok_or_else(|| {
                    anyhow!(
                        ">>{} at line {} references a fact slot with no earlier declaration",
                        kw,
                        lno
                    )
                })?;
                self.events.push(TraceEvent::Info(InfoEvent {
                    line: lno,
                    subject,
                    tag,
                    payload,
                    referenced: true,
                }));
            }
        }
        Ok(())
    }
}

fn subject_of(addrs: &[&str]) -> Subject {
    match addrs {
        [node] => Subject::Node(NodeAddr::from(*node)),
        [src, dst] => Subject::Edge(EdgeAddr::new(NodeAddr::from(*src), NodeAddr::from(*dst))),
        _ => Subject::Global,
    }
}
