//! Small fixed session showing every instruction, for `dftrace demo`.

use std::io::{self, Write};

use crate::emit::TraceEmitter;

pub fn write_demo<W: Write>(e: &mut TraceEmitter<W>) -> io::Result<()> {
    e.select_group("functionA")?;
    e.add_node("n1", None, Some("x = 1"))?;
    e.add_node("n2", None, Some("y = x + 2"))?;
    e.add_edge("n1", "n2", None, None)?;
    e.add_node_info("n1", r#"{"defined_vars": ["x"]}"#, None, None)?;
    e.add_node_info("n2", r#"{"used_vars": ["x"], "defined_vars": ["y"]}"#, None, None)?;
    e.add_edge_info("n1", "n2", r#"{"live": ["x"]}"#, None, None, Some("live"))?;
    e.add_prev_node_info("n1", None, None)?;
    e.add_prev_edge_info("n1", "n2", None, None, Some("live"))?;
    e.add_global_info(r#"{"heap": {"x": 1, "y": 3}}"#, None)?;
    e.add_prev_global_info(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitConfig;
    use crate::trace::parse_trace_str;

    #[test]
    fn demo_is_a_valid_trace() {
        let mut e = TraceEmitter::new(Vec::new(), EmitConfig::default());
        write_demo(&mut e).unwrap();
        let text = String::from_utf8(e.finish().unwrap()).unwrap();

        let summary = parse_trace_str(&text).unwrap().summary();
        assert_eq!(summary.groups, vec!["functionA"]);
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.declared, 4);
        assert_eq!(summary.referenced, 3);
    }
}
