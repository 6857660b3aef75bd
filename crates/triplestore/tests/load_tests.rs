//! Load protocol integration tests
//!
//! Stub reader and clock implementations drive the skip-load policy,
//! replace/append semantics, rollback on parser termination, blank-node
//! session scoping, and script-sourced loads.

use triplestore::{
    LoadError, LoadInput, LoadResult, NodeId, RdfReader, SourceClock, Store, StoreError,
    StoreResult, Triple, TriplePattern, TripleSink, NULL_NODE,
};

/// Oracle returning a fixed modification time.
struct FixedClock(i64);

impl SourceClock for FixedClock {
    fn modification_time(&self, _uri: &str) -> StoreResult<i64> {
        Ok(self.0)
    }
}

/// Oracle that always fails.
struct BrokenClock;

impl SourceClock for BrokenClock {
    fn modification_time(&self, uri: &str) -> StoreResult<i64> {
        Err(StoreError::Fetch {
            uri: uri.to_owned(),
            reason: "unreachable".to_owned(),
        })
    }
}

/// Reader emitting a fixed tuple list, ignoring the input.
struct StubReader {
    triples: Vec<(String, String, String)>,
}

impl StubReader {
    fn new(triples: &[(&str, &str, &str)]) -> Self {
        Self {
            triples: triples
                .iter()
                .map(|(s, p, o)| (s.to_string(), p.to_string(), o.to_string()))
                .collect(),
        }
    }
}

impl RdfReader for StubReader {
    fn read(
        &mut self,
        _uri: &str,
        _input: &LoadInput<'_>,
        sink: &mut dyn TripleSink,
    ) -> LoadResult<()> {
        for (s, p, o) in &self.triples {
            let s = sink.resource(s)?;
            let p = sink.resource(p)?;
            let o = sink.literal(o, NULL_NODE, None)?;
            sink.assert(s, p, o)?;
        }
        Ok(())
    }
}

/// Reader that parses inline content as one `s p o` line per triple, with
/// `_:label` object syntax for blank nodes.
struct LineReader;

impl RdfReader for LineReader {
    fn read(
        &mut self,
        uri: &str,
        input: &LoadInput<'_>,
        sink: &mut dyn TripleSink,
    ) -> LoadResult<()> {
        let LoadInput::Inline(content) = input else {
            return Err(LoadError::Terminated(format!("no content for {uri}")));
        };
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let mut fields = line.split_whitespace();
            let (Some(s), Some(p), Some(o)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(LoadError::Terminated(format!("bad line: {line}")));
            };
            let s = sink.resource(s)?;
            let p = sink.resource(p)?;
            let o = match o.strip_prefix("_:") {
                Some(label) => sink.blank(label)?,
                None => sink.resource(o)?,
            };
            sink.assert(s, p, o)?;
        }
        Ok(())
    }
}

/// Reader that emits one triple and then terminates abnormally.
struct FailingReader;

impl RdfReader for FailingReader {
    fn read(
        &mut self,
        _uri: &str,
        _input: &LoadInput<'_>,
        sink: &mut dyn TripleSink,
    ) -> LoadResult<()> {
        let s = sink.resource("urn:partial")?;
        sink.assert(s, s, s)?;
        Err(LoadError::Terminated("malformed input".to_owned()))
    }
}

fn source_node(store: &Store) -> NodeId {
    store.node(Some("http://example.org/data.rdf"), false).unwrap()
}

fn persistent_count(store: &Store, source: NodeId) -> i64 {
    store
        .count(&TriplePattern::any().with_source(source), false)
        .unwrap()
}

// ============================================================================
// Skip-load policy (scenario: load, unchanged, newer)
// ============================================================================

#[test]
fn test_load_then_skip_then_reload() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    // First load at t=100 inserts and records the source.
    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    assert!(store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap());
    assert_eq!(persistent_count(&store, src), 1);
    assert_eq!(store.all_sources().unwrap(), vec![src]);

    // Second load at the same time is skipped: the new content is not read.
    let mut reader = StubReader::new(&[("urn:a", "urn:p", "2")]);
    assert!(store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap());
    assert_eq!(persistent_count(&store, src), 1);
    let o1 = store.literal("1", NULL_NODE, None).unwrap();
    assert!(store
        .exists(
            &TriplePattern::new(NULL_NODE, NULL_NODE, o1).with_source(src),
            false
        )
        .unwrap());

    // Third load with a newer time replaces the triples under this source.
    let mut reader = StubReader::new(&[("urn:a", "urn:p", "2")]);
    assert!(store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(200))
        .unwrap());
    assert_eq!(persistent_count(&store, src), 1);
    assert!(!store
        .exists(
            &TriplePattern::new(NULL_NODE, NULL_NODE, o1).with_source(src),
            false
        )
        .unwrap());
}

#[test]
fn test_unknown_remote_time_skips_known_source() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap();

    // 0 means "unknown": a known source is not reloaded.
    let mut reader = StubReader::new(&[("urn:a", "urn:p", "2")]);
    assert!(store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(0))
        .unwrap());
    assert_eq!(persistent_count(&store, src), 1);
}

#[test]
fn test_load_idempotence() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);
    let tuples = [("urn:a", "urn:p", "1"), ("urn:b", "urn:p", "2")];

    let mut reader = StubReader::new(&tuples);
    store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap();
    let first = store.query_all(&TriplePattern::any()).unwrap();

    let mut reader = StubReader::new(&tuples);
    store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(200))
        .unwrap();
    let second = store.query_all(&TriplePattern::any()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_append_keeps_previous_triples() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap();
    let mut reader = StubReader::new(&[("urn:b", "urn:p", "2")]);
    store
        .load(src, &LoadInput::Remote, true, &mut reader, &FixedClock(200))
        .unwrap();

    assert_eq!(persistent_count(&store, src), 2);
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn test_fetcher_failure_reports_without_changes() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    assert!(!store
        .load(src, &LoadInput::Remote, false, &mut reader, &BrokenClock)
        .unwrap());
    assert_eq!(persistent_count(&store, src), 0);
    assert!(store.all_sources().unwrap().is_empty());
}

#[test]
fn test_parser_termination_rolls_back() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap();

    // The failing reader asserts one triple before terminating; the whole
    // pass rolls back, leaving the previous content in place.
    assert!(!store
        .load(
            src,
            &LoadInput::Remote,
            false,
            &mut FailingReader,
            &FixedClock(200)
        )
        .unwrap());
    assert_eq!(persistent_count(&store, src), 1);
    let partial = store.node(Some("urn:partial"), false).unwrap();
    assert!(!store
        .exists(&TriplePattern::new(partial, partial, partial), false)
        .unwrap());
}

// ============================================================================
// Inline and script inputs
// ============================================================================

#[test]
fn test_inline_load_skips_time_check() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    store
        .load(
            src,
            &LoadInput::Inline("urn:a urn:p urn:b\n"),
            false,
            &mut LineReader,
            &BrokenClock,
        )
        .unwrap();
    assert_eq!(persistent_count(&store, src), 1);

    // An inline load records created = 0 (unknown), so a later remote load
    // with any real time reloads.
    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    assert!(store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap());
    let o = store.literal("1", NULL_NODE, None).unwrap();
    assert!(store
        .exists(
            &TriplePattern::new(NULL_NODE, NULL_NODE, o).with_source(src),
            false
        )
        .unwrap());
}

#[test]
fn test_blank_node_labels_are_session_scoped() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    store
        .load(
            src,
            &LoadInput::Inline("urn:a urn:p _:x\nurn:b urn:p _:x\n"),
            false,
            &mut LineReader,
            &BrokenClock,
        )
        .unwrap();
    // Within one load the label maps to a single node.
    let a = store.node(Some("urn:a"), false).unwrap();
    let b = store.node(Some("urn:b"), false).unwrap();
    let p = store.node(Some("urn:p"), false).unwrap();
    let from_a = store.query_all(&TriplePattern::new(a, p, NULL_NODE)).unwrap();
    let from_b = store.query_all(&TriplePattern::new(b, p, NULL_NODE)).unwrap();
    assert_eq!(from_a[0].object, from_b[0].object);

    // A second load starts a fresh blank-node session.
    store
        .load(
            src,
            &LoadInput::Inline("urn:c urn:p _:x\n"),
            true,
            &mut LineReader,
            &BrokenClock,
        )
        .unwrap();
    let c = store.node(Some("urn:c"), false).unwrap();
    let from_c = store.query_all(&TriplePattern::new(c, p, NULL_NODE)).unwrap();
    assert_ne!(from_c[0].object, from_a[0].object);
}

#[test]
fn test_post_process_runs_during_load() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap();

    let p = store.node(Some("urn:p"), false).unwrap();
    assert!(store
        .exists(
            &TriplePattern::new(p, NodeId::RDF_TYPE, NodeId::RDF_PROPERTY),
            true
        )
        .unwrap());
}

#[cfg(unix)]
#[test]
fn test_script_load_parses_command_output() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    let args = vec!["urn:a urn:p urn:b".to_string()];
    assert!(store
        .load(
            src,
            &LoadInput::Script {
                command: "echo",
                args: &args,
            },
            false,
            &mut LineReader,
            &BrokenClock,
        )
        .unwrap());
    assert_eq!(persistent_count(&store, src), 1);
}

#[cfg(unix)]
#[test]
fn test_script_failure_terminates_load() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    assert!(!store
        .load(
            src,
            &LoadInput::Script {
                command: "false",
                args: &[],
            },
            false,
            &mut LineReader,
            &BrokenClock,
        )
        .unwrap());
    assert_eq!(persistent_count(&store, src), 0);
}

// ============================================================================
// Source deletion
// ============================================================================

#[test]
fn test_del_source_removes_triples_and_registry_row() {
    let store = Store::open_in_memory().unwrap();
    let src = source_node(&store);

    let mut reader = StubReader::new(&[("urn:a", "urn:p", "1")]);
    store
        .load(src, &LoadInput::Remote, false, &mut reader, &FixedClock(100))
        .unwrap();

    store.del_source(src).unwrap();
    assert_eq!(persistent_count(&store, src), 0);
    assert!(store.all_sources().unwrap().is_empty());
}
