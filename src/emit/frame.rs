//! Instruction framing: keyword table and header line assembly.

/// Prefix that marks an instruction line.
pub const SENTINEL: &str = ">>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    SelectGroup,
    Node,
    Edge,
    NodeInfo,
    EdgeInfo,
    GlobalInfo,
    PrevNodeInfo,
    PrevEdgeInfo,
    PrevGlobalInfo,
}

impl Op {
    pub const ALL: [Op; 9] = [
        Op::SelectGroup,
        Op::Node,
        Op::Edge,
        Op::NodeInfo,
        Op::EdgeInfo,
        Op::GlobalInfo,
        Op::PrevNodeInfo,
        Op::PrevEdgeInfo,
        Op::PrevGlobalInfo,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Op::SelectGroup => "selectgroup",
            Op::Node => "node",
            Op::Edge => "edge",
            Op::NodeInfo => "nodeinfo",
            Op::EdgeInfo => "edgeinfo",
            Op::GlobalInfo => "globalinfo",
            Op::PrevNodeInfo => "prevnodeinfo",
            Op::PrevEdgeInfo => "prevedgeinfo",
            Op::PrevGlobalInfo => "prevglobalinfo",
        }
    }

    pub fn from_keyword(kw: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.keyword() == kw)
    }

    /// Declare-type instructions may be followed by one content block.
    pub fn takes_body(self) -> bool {
        matches!(self, Op::Node | Op::NodeInfo | Op::EdgeInfo | Op::GlobalInfo)
    }

    /// Number of positional addresses before the optional tag.
    pub fn address_arity(self) -> usize {
        match self {
            Op::SelectGroup => 1,
            Op::Node | Op::NodeInfo | Op::PrevNodeInfo => 1,
            Op::Edge | Op::EdgeInfo | Op::PrevEdgeInfo => 2,
            Op::GlobalInfo | Op::PrevGlobalInfo => 0,
        }
    }

    pub fn takes_tag(self) -> bool {
        matches!(
            self,
            Op::NodeInfo
                | Op::EdgeInfo
                | Op::GlobalInfo
                | Op::PrevNodeInfo
                | Op::PrevEdgeInfo
                | Op::PrevGlobalInfo
        )
    }
}

/// Positional argument list; absent optionals are skipped, never padded.
#[derive(Debug, Default)]
pub struct Args<'a>(Vec<&'a str>);

impl<'a> Args<'a> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(mut self, arg: &'a str) -> Self {
        self.0.push(arg);
        self
    }

    pub fn push_opt(mut self, arg: Option<&'a str>) -> Self {
        if let Some(a) = arg.filter(|a| !a.is_empty()) {
            self.0.push(a);
        }
        self
    }

    pub fn as_slice(&self) -> &[&'a str] {
        &self.0
    }
}

/// Render the header line for `op`, without the trailing newline.
pub fn header(op: Op, args: &Args<'_>) -> String {
    let mut line = format!("{}{}", SENTINEL, op.keyword());
    for a in args.as_slice() {
        line.push(' ');
        line.push_str(a);
    }
    line
}
