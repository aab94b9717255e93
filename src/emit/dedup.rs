//! Payload cache and the declare-or-reference driver.
//!
//! The cache holds the last payload declared into each fact slot. The
//! `record_*` methods consult it and write a `prev*` back-reference when the
//! slot already holds a byte-identical payload.

use crate::addr::{DedupKey, Subject};
use crate::config::DedupScope;
use crate::emit::writer::TraceEmitter;

use std::collections::HashMap;
use std::io::{self, Write};

#[derive(Debug, Default)]
pub struct DedupCache {
    last: HashMap<DedupKey, String>,
}

impl DedupCache {
    pub fn get(&self, key: &DedupKey) -> Option<&str> {
        self.last.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: DedupKey, payload: String) {
        self.last.insert(key, payload);
    }

    pub fn holds(&self, key: &DedupKey, payload: &str) -> bool {
        self.get(key) == Some(payload)
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}

/// Which form `record_*` wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Declared,
    Referenced,
}

impl<W: Write> TraceEmitter<W> {
    pub fn record_node_info(
        &mut self,
        id: &str,
        payload: &str,
        group: Option<&str>,
        tag: Option<&str>,
    ) -> io::Result<Recorded> {
        let addr = self.node_addr(id, group);
        self.record(Subject::Node(addr), tag, payload)
    }

    pub fn record_edge_info(
        &mut self,
        src: &str,
        dst: &str,
        payload: &str,
        src_group: Option<&str>,
        dst_group: Option<&str>,
        tag: Option<&str>,
    ) -> io::Result<Recorded> {
        let edge = self.edge_addr(src, dst, src_group, dst_group);
        self.record(Subject::Edge(edge), tag, payload)
    }

    pub fn record_global_info(&mut self, payload: &str, tag: Option<&str>) -> io::Result<Recorded> {
        self.record(Subject::Global, tag, payload)
    }

    fn record(&mut self, subject: Subject, tag: Option<&str>, payload: &str) -> io::Result<Recorded> {
        if self.config.dedup != DedupScope::Off {
            let normalized = self.config.content.normalize(payload);
            let key = DedupKey::new(subject.clone(), tag);
            if self.cache.holds(&key, &normalized) {
                self.reference(&subject, tag)?;
                return Ok(Recorded::Referenced);
            }
        }
        self.declare(subject, tag, payload)?;
        Ok(Recorded::Declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitConfig;
    use pretty_assertions::assert_eq;

    fn emitter(dedup: DedupScope) -> TraceEmitter<Vec<u8>> {
        let config = EmitConfig {
            dedup,
            ..EmitConfig::default()
        };
        TraceEmitter::new(Vec::new(), config)
    }

    fn text(e: TraceEmitter<Vec<u8>>) -> String {
        String::from_utf8(e.finish().unwrap()).unwrap()
    }

    #[test]
    fn identical_payload_becomes_reference() {
        let mut e = emitter(DedupScope::Session);
        assert_eq!(e.record_node_info("n1", "{}", Some("f"), None).unwrap(), Recorded::Declared);
        assert_eq!(e.record_node_info("n1", "{}", Some("f"), None).unwrap(), Recorded::Referenced);

        assert_eq!(text(e), ">>nodeinfo f:n1\n{}\n>>prevnodeinfo f:n1\n");
    }

    #[test]
    fn changed_payload_is_redeclared_and_cached() {
        let mut e = emitter(DedupScope::Session);
        e.record_node_info("n1", "a", None, Some("t")).unwrap();
        e.record_node_info("n1", "b", None, Some("t")).unwrap();
        e.record_node_info("n1", "b", None, Some("t")).unwrap();
        e.record_node_info("n1", "a", None, Some("t")).unwrap();

        assert_eq!(
            text(e),
            concat!(
                ">>nodeinfo n1 t\n",
                "a\n",
                ">>nodeinfo n1 t\n",
                "b\n",
                ">>prevnodeinfo n1 t\n",
                ">>nodeinfo n1 t\n",
                "a\n",
            )
        );
    }

    #[test]
    fn tag_separates_slots() {
        let mut e = emitter(DedupScope::Session);
        e.record_node_info("n1", "a", None, Some("in")).unwrap();
        let second = e.record_node_info("n1", "a", None, Some("out")).unwrap();
        let third = e.record_node_info("n1", "a", None, None).unwrap();

        assert_eq!(second, Recorded::Declared);
        assert_eq!(third, Recorded::Declared);
    }

    #[test]
    fn identical_global_info_is_referenced() {
        let mut e = emitter(DedupScope::Session);
        e.record_global_info(r#"{"heap":{}}"#, None).unwrap();
        e.record_global_info(r#"{"heap":{}}"#, None).unwrap();

        assert_eq!(text(e), ">>globalinfo\n{\"heap\":{}}\n>>prevglobalinfo\n");
    }

    #[test]
    fn edge_info_dedups_on_both_endpoints() {
        let mut e = emitter(DedupScope::Session);
        e.record_edge_info("a", "b", "x", None, None, None).unwrap();
        let same = e.record_edge_info("a", "b", "x", None, None, None).unwrap();
        let reversed = e.record_edge_info("b", "a", "x", None, None, None).unwrap();

        assert_eq!(same, Recorded::Referenced);
        assert_eq!(reversed, Recorded::Declared);
    }

    #[test]
    fn trailing_whitespace_does_not_defeat_dedup() {
        let mut e = emitter(DedupScope::Session);
        e.record_global_info("{}", None).unwrap();
        let again = e.record_global_info("{}\n  ", None).unwrap();
        assert_eq!(again, Recorded::Referenced);
    }

    #[test]
    fn manual_declare_feeds_the_cache() {
        let mut e = emitter(DedupScope::Session);
        e.add_node_info("n1", "p", None, None).unwrap();
        let r = e.record_node_info("n1", "p", None, None).unwrap();
        assert_eq!(r, Recorded::Referenced);
    }

    // Global facts carry no address, so session scope shares them across groups.
    #[test]
    fn global_facts_share_cache_across_groups_by_default() {
        let mut e = emitter(DedupScope::Session);
        e.select_group("f").unwrap();
        e.record_global_info("g", None).unwrap();
        e.select_group("h").unwrap();
        let r = e.record_global_info("g", None).unwrap();
        assert_eq!(r, Recorded::Referenced);
    }

    // A reference must resolve to the latest declaration in the stream, so
    // group scope forgets everything at each selectgroup.
    #[test]
    fn group_scope_starts_each_group_fresh() {
        let mut e = emitter(DedupScope::Group);
        e.select_group("f").unwrap();
        e.record_global_info("g", None).unwrap();
        e.select_group("h").unwrap();
        assert_eq!(e.record_global_info("g", None).unwrap(), Recorded::Declared);
        assert_eq!(e.record_global_info("g", None).unwrap(), Recorded::Referenced);
        e.select_group("f").unwrap();
        assert_eq!(e.record_global_info("g", None).unwrap(), Recorded::Declared);
    }

    #[test]
    fn qualified_nodes_never_collide_across_groups() {
        let mut e = emitter(DedupScope::Session);
        e.select_group("f").unwrap();
        e.record_node_info("n1", "p", None, None).unwrap();
        e.select_group("g").unwrap();
        assert_eq!(e.record_node_info("n1", "p", None, None).unwrap(), Recorded::Declared);
    }

    #[test]
    fn off_scope_always_declares() {
        let mut e = emitter(DedupScope::Off);
        e.record_global_info("g", None).unwrap();
        assert_eq!(e.record_global_info("g", None).unwrap(), Recorded::Declared);
    }
}
