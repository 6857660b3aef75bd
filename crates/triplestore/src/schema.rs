//! Database schema definitions
//!
//! The persistent schema lives in the database file; the transient schema is
//! an in-memory database attached as `cache` on every open, so its contents
//! are scoped to one connection.

/// Schema version recorded in the `info` table.
pub(crate) const SCHEMA_VERSION: &str = "1";

/// Probe used to decide whether the file already holds a store database.
pub(crate) const PROBE: &str = "SELECT version FROM info";

/// Persistent schema, created when the probe fails.
pub(crate) const CREATE_SCHEMA: &str = "\
CREATE TABLE info (version TEXT);
CREATE TABLE node (id INTEGER PRIMARY KEY, str TEXT, datatype INTEGER, lang TEXT);
CREATE TABLE triple (s INTEGER, p INTEGER, o INTEGER, src INTEGER);
CREATE TABLE namespace (prefix TEXT UNIQUE, uri TEXT, active INTEGER);
CREATE TABLE source (src INTEGER, created INTEGER, loaded INTEGER);
CREATE INDEX node_str_idx ON node (str);
CREATE INDEX triple_spo_idx ON triple (s, p, o, src);
";

/// Transient overlay: attached in-memory schema with the triple overlay and
/// the per-parse blank-node table.
pub(crate) const CREATE_CACHE_SCHEMA: &str = "\
ATTACH ':memory:' AS cache;
CREATE TABLE cache.triple (s INTEGER, p INTEGER, o INTEGER, src INTEGER);
CREATE TABLE cache.bnode (id INTEGER, str TEXT);
";
