//! The triple store
//!
//! A persistent node dictionary and triple table with a transient in-memory
//! overlay, plus the namespace and source registries. All operations on the
//! public [`Store`] type are serialized by a process-wide mutex; the
//! internals operate on `StoreInner` so that one public entry point locks
//! exactly once.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::node::{vocab, NodeId, Triple, NULL_NODE};
use crate::pattern::TriplePattern;
use crate::schema;
use crate::sql::Database;

/// Lexical details of a stored node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    /// URI string for resources, lexical value for literals, `None` for
    /// anonymous resources created without a URI.
    pub text: Option<String>,
    /// Datatype node, `NULL_NODE` when untyped.
    pub datatype: NodeId,
    /// BCP-47 language tag, if any.
    pub lang: Option<String>,
}

impl NodeInfo {
    fn missing() -> Self {
        Self {
            text: None,
            datatype: NULL_NODE,
            lang: None,
        }
    }
}

/// SQLite-backed RDF triple store.
pub struct Store {
    inner: Mutex<StoreInner>,
}

pub(crate) struct StoreInner {
    pub(crate) db: Database,
}

impl Store {
    /// Open (or create) a store database at `path`.
    pub fn open(path: &str) -> StoreResult<Self> {
        Self::from_database(Database::open(path)?)
    }

    /// Open a store backed entirely by memory. Nothing is persisted.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_database(Database::open_in_memory()?)
    }

    fn from_database(db: Database) -> StoreResult<Self> {
        let mut inner = StoreInner { db };
        inner.init()?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Borrow the underlying SQL database, holding the store mutex.
    ///
    /// Used by query layers that execute compiled SQL against this store's
    /// connection (the transient `cache` schema is connection-scoped).
    pub fn database(&self) -> MappedMutexGuard<'_, Database> {
        MutexGuard::map(self.inner.lock(), |inner| &mut inner.db)
    }

    pub(crate) fn lock_inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock()
    }

    /// Intern a resource node.
    ///
    /// With `blank = false` and `uri = None` a fresh anonymous resource is
    /// allocated. With `blank = true` the transient blank-node table is
    /// consulted first, so a label is reused within one parse session.
    pub fn node(&self, uri: Option<&str>, blank: bool) -> StoreResult<NodeId> {
        self.inner.lock().node(uri, blank)
    }

    /// Intern a literal with `(text, datatype, lang)` discrimination.
    ///
    /// A non-null datatype takes precedence over a language tag; the two are
    /// mutually exclusive in well-formed input.
    pub fn literal(&self, text: &str, datatype: NodeId, lang: Option<&str>) -> StoreResult<NodeId> {
        self.inner.lock().literal(text, datatype, lang)
    }

    /// Reassign a literal's datatype. Idempotent; `false` for resource ids.
    pub fn augment_literal(&self, literal: NodeId, datatype: NodeId) -> StoreResult<bool> {
        self.inner.lock().augment_literal(literal, datatype)
    }

    /// Lexical details of a node; all-`None` when the id is unknown.
    pub fn info(&self, id: NodeId) -> StoreResult<NodeInfo> {
        self.inner.lock().info(id)
    }

    /// Wilbur-style textual rendering of a node.
    pub fn render(&self, id: NodeId) -> StoreResult<String> {
        self.inner.lock().render(id)
    }

    /// Wilbur-style textual rendering of a triple.
    pub fn render_triple(&self, triple: &Triple) -> StoreResult<String> {
        self.inner.lock().render_triple(triple)
    }

    /// Insert a triple; no-op returning `false` when it already exists.
    ///
    /// Transient inserts dedup against both layers, persistent inserts
    /// against the persistent layer only.
    pub fn add(&self, triple: &Triple, source: NodeId, temporary: bool) -> StoreResult<bool> {
        self.inner.lock().add(triple, source, temporary)
    }

    /// Apply the RDF/RDFS post-process rule for an asserted triple.
    ///
    /// Returns whether any derived triples were produced.
    pub fn add_post_process(&self, triple: &Triple) -> StoreResult<bool> {
        self.inner.lock().add_post_process(triple)
    }

    /// Remove a triple from the given layer; `false` when not found.
    pub fn del(&self, triple: &Triple, source: NodeId, temporary: bool) -> StoreResult<bool> {
        self.inner.lock().del(triple, source, temporary)
    }

    /// Check whether any triple matches the pattern in the given layer.
    pub fn exists(&self, pattern: &TriplePattern, temporary: bool) -> StoreResult<bool> {
        self.inner.lock().exists(pattern, temporary)
    }

    /// Count matching triples in the given layer.
    pub fn count(&self, pattern: &TriplePattern, temporary: bool) -> StoreResult<i64> {
        self.inner.lock().count(pattern, temporary)
    }

    /// Enumerate matching triples from the union of both layers (distinct).
    ///
    /// The action returns `false` to stop; the result reports whether the
    /// enumeration ran to completion.
    pub fn query<F>(&self, pattern: &TriplePattern, action: F) -> StoreResult<bool>
    where
        F: FnMut(&Triple) -> bool,
    {
        self.inner.lock().query(pattern, action)
    }

    /// Collect matching triples from the union of both layers.
    pub fn query_all(&self, pattern: &TriplePattern) -> StoreResult<Vec<Triple>> {
        self.inner.lock().query_all(pattern)
    }

    /// Enumerate distinct provenance sources of a triple pattern
    /// (persistent layer only).
    pub fn sources<F>(&self, triple: &Triple, action: F) -> StoreResult<bool>
    where
        F: FnMut(NodeId) -> bool,
    {
        self.inner.lock().sources(triple, action)
    }

    /// Collect distinct provenance sources of a triple pattern.
    pub fn sources_of(&self, triple: &Triple) -> StoreResult<Vec<NodeId>> {
        self.inner.lock().sources_of(triple)
    }

    /// Enumerate nodes whose lexical form starts with `prefix` (SQL `LIKE`).
    pub fn match_nodes<F>(&self, prefix: &str, action: F) -> StoreResult<bool>
    where
        F: FnMut(NodeId) -> bool,
    {
        self.inner.lock().match_nodes(prefix, action)
    }

    /// Register a namespace prefix; `false` when the prefix is taken.
    pub fn add_namespace(&self, prefix: &str, uri: &str) -> StoreResult<bool> {
        self.inner.lock().add_namespace(prefix, uri)
    }

    /// Remove a namespace prefix.
    pub fn del_namespace(&self, prefix: &str) -> StoreResult<()> {
        self.inner.lock().del_namespace(prefix)
    }

    /// Namespace URI registered for a prefix.
    pub fn namespace_uri(&self, prefix: &str) -> StoreResult<Option<String>> {
        self.inner.lock().namespace_uri(prefix)
    }

    /// Prefix registered for a namespace URI.
    pub fn namespace_prefix(&self, uri: &str) -> StoreResult<Option<String>> {
        self.inner.lock().namespace_prefix(uri)
    }

    /// `prefix:local` form of a node's URI, when its namespace is registered.
    pub fn node_qname(&self, id: NodeId) -> StoreResult<Option<String>> {
        self.inner.lock().node_qname(id)
    }

    /// `prefix:local` form of a URI, when its namespace is registered.
    pub fn qname_for_uri(&self, uri: &str) -> StoreResult<Option<String>> {
        self.inner.lock().qname_for_uri(uri)
    }

    /// Expand `prefix:local` to a URI; `None` when the prefix is unknown.
    ///
    /// A qname without a colon is malformed.
    pub fn qname_to_uri(&self, qname: &str) -> StoreResult<Option<String>> {
        self.inner.lock().qname_to_uri(qname)
    }

    /// Lenient qname expansion: URIs with a real scheme, prefixless strings,
    /// and unknown prefixes pass through unchanged.
    pub fn try_qname_to_uri(&self, qname: &str) -> StoreResult<String> {
        self.inner.lock().try_qname_to_uri(qname)
    }

    /// Delete all triples loaded from a source, in both layers.
    pub fn del_source_triples(&self, source: NodeId) -> StoreResult<()> {
        self.inner.lock().del_source_triples(source)
    }

    /// Delete a source's triples and its registry row, transactionally.
    pub fn del_source(&self, source: NodeId) -> StoreResult<()> {
        self.inner.lock().del_source(source)
    }

    /// All registered provenance sources.
    pub fn all_sources(&self) -> StoreResult<Vec<NodeId>> {
        self.inner.lock().all_sources()
    }

    /// Begin an explicit transaction.
    pub fn transaction(&self) -> StoreResult<()> {
        self.inner.lock().transaction()
    }

    /// Commit the open transaction.
    pub fn commit(&self) -> StoreResult<()> {
        self.inner.lock().commit()
    }

    /// Roll back the open transaction.
    pub fn rollback(&self) -> StoreResult<()> {
        self.inner.lock().rollback()
    }
}

impl StoreInner {
    fn init(&mut self) -> StoreResult<()> {
        self.db
            .exec_batch(schema::CREATE_CACHE_SCHEMA)
            .map_err(StoreError::Open)?;
        let probe: Result<String, _> =
            self.db
                .connection()
                .query_row(schema::PROBE, [], |row| row.get(0));
        match probe {
            Ok(version) => debug!(%version, "existing database"),
            Err(_) => {
                debug!("creating a new database");
                self.db
                    .exec_batch(schema::CREATE_SCHEMA)
                    .map_err(StoreError::Open)?;
                self.seed()?;
            }
        }
        Ok(())
    }

    fn seed(&mut self) -> StoreResult<()> {
        let conn = self.db.connection();
        conn.execute("INSERT INTO info VALUES (?1)", [schema::SCHEMA_VERSION])
            .map_err(StoreError::Open)?;
        for (id, uri) in vocab::WELL_KNOWN {
            conn.execute(
                "INSERT INTO node VALUES (?1, ?2, 0, NULL)",
                params![id, uri],
            )
            .map_err(StoreError::NodeInsert)?;
        }
        for (prefix, uri) in [("rdf", vocab::RDF_NS), ("rdfs", vocab::RDFS_NS)] {
            conn.execute(
                "INSERT INTO namespace VALUES (?1, ?2, 1)",
                params![prefix, uri],
            )
            .map_err(StoreError::NamespaceInsert)?;
        }
        Ok(())
    }

    fn new_resource_id(&mut self) -> StoreResult<NodeId> {
        let max: Option<i64> = self
            .db
            .connection()
            .query_row("SELECT max(id) FROM node", [], |row| row.get(0))
            .map_err(StoreError::NodeIdAlloc)?;
        Ok(NodeId(max.unwrap_or(0).max(0) + 1))
    }

    fn new_literal_id(&mut self) -> StoreResult<NodeId> {
        let min: Option<i64> = self
            .db
            .connection()
            .query_row("SELECT min(id) FROM node", [], |row| row.get(0))
            .map_err(StoreError::NodeIdAlloc)?;
        // Clamp so the first literal in a resources-only table is -1.
        Ok(NodeId(min.unwrap_or(0).min(0) - 1))
    }

    pub(crate) fn node(&mut self, uri: Option<&str>, blank: bool) -> StoreResult<NodeId> {
        if blank {
            let Some(label) = uri else {
                return self.node(None, false);
            };
            let found: Option<NodeId> = self
                .db
                .connection()
                .query_row(
                    "SELECT id FROM cache.bnode WHERE str = ?1",
                    [label],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::NodeFind)?;
            if let Some(id) = found {
                return Ok(id);
            }
            let id = self.node(None, false)?;
            self.db
                .connection()
                .execute(
                    "INSERT INTO cache.bnode VALUES (?1, ?2)",
                    params![id, label],
                )
                .map_err(StoreError::NodeInsert)?;
            Ok(id)
        } else if let Some(uri) = uri {
            let found: Option<NodeId> = self
                .db
                .connection()
                .query_row(
                    "SELECT id FROM node WHERE str = ?1 AND id > 0",
                    [uri],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::NodeFind)?;
            if let Some(id) = found {
                return Ok(id);
            }
            let id = self.new_resource_id()?;
            self.db
                .connection()
                .execute("INSERT INTO node VALUES (?1, ?2, 0, NULL)", params![id, uri])
                .map_err(StoreError::NodeInsert)?;
            debug!(%id, %uri, "new resource");
            Ok(id)
        } else {
            let id = self.new_resource_id()?;
            self.db
                .connection()
                .execute("INSERT INTO node VALUES (?1, NULL, 0, NULL)", [id])
                .map_err(StoreError::NodeInsert)?;
            debug!(%id, "new anonymous resource");
            Ok(id)
        }
    }

    pub(crate) fn literal(
        &mut self,
        text: &str,
        datatype: NodeId,
        lang: Option<&str>,
    ) -> StoreResult<NodeId> {
        let conn = self.db.connection();
        let found: Option<NodeId> = if !datatype.is_null() {
            conn.query_row(
                "SELECT id FROM node WHERE str = ?1 AND id < 0 AND datatype = ?2",
                params![text, datatype],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::NodeFind)?
        } else if let Some(lang) = lang {
            conn.query_row(
                "SELECT id FROM node WHERE str = ?1 AND id < 0 AND lang = ?2",
                params![text, lang],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::NodeFind)?
        } else {
            // The plain lookup deliberately ignores the datatype column: a
            // literal augmented with a datatype on an earlier load must be
            // found again when the same lexical form is re-interned.
            conn.query_row(
                "SELECT id FROM node WHERE str = ?1 AND id < 0",
                [text],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::NodeFind)?
        };
        if let Some(id) = found {
            return Ok(id);
        }
        let id = self.new_literal_id()?;
        let conn = self.db.connection();
        if !datatype.is_null() {
            conn.execute(
                "INSERT INTO node VALUES (?1, ?2, ?3, NULL)",
                params![id, text, datatype],
            )
        } else if let Some(lang) = lang {
            conn.execute(
                "INSERT INTO node VALUES (?1, ?2, 0, ?3)",
                params![id, text, lang],
            )
        } else {
            conn.execute("INSERT INTO node VALUES (?1, ?2, 0, NULL)", params![id, text])
        }
        .map_err(StoreError::NodeInsert)?;
        debug!(%id, %text, "new literal");
        Ok(id)
    }

    pub(crate) fn augment_literal(
        &mut self,
        literal: NodeId,
        datatype: NodeId,
    ) -> StoreResult<bool> {
        if !literal.is_literal() {
            return Ok(false);
        }
        let current = self.info(literal)?;
        if current.datatype == datatype {
            return Ok(true);
        }
        self.db
            .connection()
            .execute(
                "UPDATE node SET datatype = ?1 WHERE id = ?2",
                params![datatype, literal],
            )
            .map_err(StoreError::NodeInsert)?;
        Ok(true)
    }

    pub(crate) fn info(&mut self, id: NodeId) -> StoreResult<NodeInfo> {
        let found = self
            .db
            .connection()
            .query_row(
                "SELECT str, datatype, lang FROM node WHERE id = ?1",
                [id],
                |row| {
                    Ok(NodeInfo {
                        text: row.get(0)?,
                        datatype: row.get::<_, Option<NodeId>>(1)?.unwrap_or(NULL_NODE),
                        lang: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::NodeDetails)?;
        Ok(found.unwrap_or_else(NodeInfo::missing))
    }

    pub(crate) fn render(&mut self, id: NodeId) -> StoreResult<String> {
        let info = self.info(id)?;
        if id.is_literal() {
            let text = info.text.unwrap_or_default();
            if !info.datatype.is_null() {
                let datatype = self.render(info.datatype)?;
                let datatype = datatype.strip_prefix('!').unwrap_or(&datatype);
                Ok(format!("#\"{text}\"^^{datatype}"))
            } else if let Some(lang) = info.lang {
                Ok(format!("#\"{text}\"@{lang}"))
            } else {
                Ok(format!("#\"{text}\""))
            }
        } else {
            match info.text {
                Some(uri) => match self.qname_for_uri(&uri)? {
                    Some(qname) => Ok(format!("!{qname}")),
                    None => Ok(format!("!\"{uri}\"")),
                },
                None => Ok(format!("!<{}>", id.0)),
            }
        }
    }

    fn render_triple(&mut self, triple: &Triple) -> StoreResult<String> {
        Ok(format!(
            "<{}, {}, {}>",
            self.render(triple.subject)?,
            self.render(triple.predicate)?,
            self.render(triple.object)?
        ))
    }

    pub(crate) fn exists(
        &mut self,
        pattern: &TriplePattern,
        temporary: bool,
    ) -> StoreResult<bool> {
        let mut sql = String::from(if temporary {
            "SELECT 1 FROM cache.triple"
        } else {
            "SELECT 1 FROM triple"
        });
        pattern.push_where(&mut sql);
        sql.push_str(" LIMIT 1");
        let found: Option<i64> = self
            .db
            .connection()
            .query_row(&sql, [], |row| row.get(0))
            .optional()
            .map_err(StoreError::NodeFind)?;
        Ok(found.is_some())
    }

    pub(crate) fn add(
        &mut self,
        triple: &Triple,
        source: NodeId,
        temporary: bool,
    ) -> StoreResult<bool> {
        let pattern = TriplePattern::from(*triple).with_source(source);
        if temporary {
            if self.exists(&pattern, true)? || self.exists(&pattern, false)? {
                return Ok(false);
            }
            self.db
                .connection()
                .execute(
                    "INSERT INTO cache.triple VALUES (?1, ?2, ?3, ?4)",
                    params![triple.subject, triple.predicate, triple.object, source],
                )
                .map_err(StoreError::TripleInsert)?;
        } else {
            if self.exists(&pattern, false)? {
                return Ok(false);
            }
            self.db
                .connection()
                .execute(
                    "INSERT INTO triple VALUES (?1, ?2, ?3, ?4)",
                    params![triple.subject, triple.predicate, triple.object, source],
                )
                .map_err(StoreError::TripleInsert)?;
        }
        debug!(triple = %triple, %source, temporary, "add");
        Ok(true)
    }

    fn add_quick(&mut self, s: NodeId, p: NodeId, o: NodeId) -> StoreResult<()> {
        self.add(&Triple::new(s, p, o), NULL_NODE, true)?;
        Ok(())
    }

    pub(crate) fn add_post_process(&mut self, triple: &Triple) -> StoreResult<bool> {
        let p = triple.predicate;
        let o = triple.object;
        self.add_quick(p, NodeId::RDF_TYPE, NodeId::RDF_PROPERTY)?;
        if p == NodeId::RDF_TYPE {
            self.add_quick(o, NodeId::RDF_TYPE, NodeId::RDFS_CLASS)?;
            self.add_quick(o, NodeId::RDFS_SUB_CLASS_OF, NodeId::RDFS_RESOURCE)?;
            Ok(true)
        } else if p == NodeId::RDFS_SUB_CLASS_OF {
            self.add_quick(o, NodeId::RDFS_SUB_CLASS_OF, NodeId::RDFS_RESOURCE)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn del(
        &mut self,
        triple: &Triple,
        source: NodeId,
        temporary: bool,
    ) -> StoreResult<bool> {
        let pattern = TriplePattern::from(*triple).with_source(source);
        if !self.exists(&pattern, temporary)? {
            return Ok(false);
        }
        let mut sql = String::from(if temporary {
            "DELETE FROM cache.triple"
        } else {
            "DELETE FROM triple"
        });
        pattern.push_where(&mut sql);
        self.db
            .connection()
            .execute(&sql, [])
            .map_err(StoreError::TripleDelete)?;
        debug!(triple = %triple, %source, temporary, "del");
        Ok(true)
    }

    pub(crate) fn count(
        &mut self,
        pattern: &TriplePattern,
        temporary: bool,
    ) -> StoreResult<i64> {
        let mut sql = String::from(if temporary {
            "SELECT count(*) FROM cache.triple"
        } else {
            "SELECT count(*) FROM triple"
        });
        pattern.push_where(&mut sql);
        self.db
            .connection()
            .query_row(&sql, [], |row| row.get(0))
            .map_err(StoreError::TripleQuery)
    }

    pub(crate) fn query<F>(&mut self, pattern: &TriplePattern, mut action: F) -> StoreResult<bool>
    where
        F: FnMut(&Triple) -> bool,
    {
        let mut persistent = String::from("SELECT s,p,o FROM triple");
        pattern.push_where(&mut persistent);
        let mut transient = String::from("SELECT s,p,o FROM cache.triple");
        pattern.push_where(&mut transient);
        // UNION implies DISTINCT
        let sql = format!("{persistent} UNION {transient}");
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&sql).map_err(StoreError::TripleQuery)?;
        let mut rows = stmt.query([]).map_err(StoreError::TripleQuery)?;
        while let Some(row) = rows.next().map_err(StoreError::TripleQuery)? {
            let triple = Triple::new(
                row.get(0).map_err(StoreError::TripleQuery)?,
                row.get(1).map_err(StoreError::TripleQuery)?,
                row.get(2).map_err(StoreError::TripleQuery)?,
            );
            if !action(&triple) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn query_all(&mut self, pattern: &TriplePattern) -> StoreResult<Vec<Triple>> {
        let mut triples = Vec::new();
        self.query(pattern, |t| {
            triples.push(*t);
            true
        })?;
        Ok(triples)
    }

    fn sources<F>(&mut self, triple: &Triple, mut action: F) -> StoreResult<bool>
    where
        F: FnMut(NodeId) -> bool,
    {
        let mut sql = String::from("SELECT DISTINCT src FROM triple");
        TriplePattern::from(*triple).push_where(&mut sql);
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&sql).map_err(StoreError::SourceQuery)?;
        let mut rows = stmt.query([]).map_err(StoreError::SourceQuery)?;
        while let Some(row) = rows.next().map_err(StoreError::SourceQuery)? {
            let source: Option<NodeId> = row.get(0).map_err(StoreError::SourceQuery)?;
            if let Some(source) = source {
                if !action(source) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn sources_of(&mut self, triple: &Triple) -> StoreResult<Vec<NodeId>> {
        let mut sources = Vec::new();
        self.sources(triple, |s| {
            sources.push(s);
            true
        })?;
        Ok(sources)
    }

    fn match_nodes<F>(&mut self, prefix: &str, mut action: F) -> StoreResult<bool>
    where
        F: FnMut(NodeId) -> bool,
    {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare("SELECT id FROM node WHERE str LIKE ?1")
            .map_err(StoreError::NodeFind)?;
        let mut rows = stmt
            .query([format!("{prefix}%")])
            .map_err(StoreError::NodeFind)?;
        while let Some(row) = rows.next().map_err(StoreError::NodeFind)? {
            let id: NodeId = row.get(0).map_err(StoreError::NodeFind)?;
            if !action(id) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn add_namespace(&mut self, prefix: &str, uri: &str) -> StoreResult<bool> {
        if self.namespace_uri(prefix)?.is_some() {
            return Ok(false);
        }
        self.db
            .connection()
            .execute(
                "INSERT INTO namespace VALUES (?1, ?2, 1)",
                params![prefix, uri],
            )
            .map_err(StoreError::NamespaceInsert)?;
        Ok(true)
    }

    fn del_namespace(&mut self, prefix: &str) -> StoreResult<()> {
        self.db
            .connection()
            .execute("DELETE FROM namespace WHERE prefix = ?1", [prefix])
            .map_err(StoreError::NamespaceDelete)?;
        Ok(())
    }

    fn namespace_uri(&mut self, prefix: &str) -> StoreResult<Option<String>> {
        self.db
            .connection()
            .query_row(
                "SELECT uri FROM namespace WHERE prefix = ?1",
                [prefix],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::NamespaceFind)
    }

    fn namespace_prefix(&mut self, uri: &str) -> StoreResult<Option<String>> {
        self.db
            .connection()
            .query_row(
                "SELECT prefix FROM namespace WHERE uri = ?1",
                [uri],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::NamespaceFind)
    }

    fn node_qname(&mut self, id: NodeId) -> StoreResult<Option<String>> {
        match self.info(id)?.text {
            Some(uri) => self.qname_for_uri(&uri),
            None => Ok(None),
        }
    }

    pub(crate) fn qname_for_uri(&mut self, uri: &str) -> StoreResult<Option<String>> {
        let Some(split) = uri.rfind(['/', '#']) else {
            return Ok(None);
        };
        // Anything at or before index 6 is part of the scheme ("http://").
        if split <= 6 {
            return Ok(None);
        }
        let (namespace, local) = uri.split_at(split + 1);
        match self.namespace_prefix(namespace)? {
            Some(prefix) => Ok(Some(format!("{prefix}:{local}"))),
            None => Ok(None),
        }
    }

    fn qname_to_uri(&mut self, qname: &str) -> StoreResult<Option<String>> {
        let Some((prefix, local)) = qname.split_once(':') else {
            return Err(StoreError::MalformedQName(qname.to_owned()));
        };
        self.db
            .connection()
            .query_row(
                "SELECT uri || ?1 FROM namespace WHERE prefix = ?2",
                params![local, prefix],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::NamespaceFind)
    }

    fn try_qname_to_uri(&mut self, qname: &str) -> StoreResult<String> {
        match qname.split_once(':') {
            None => Ok(qname.to_owned()),
            Some((prefix, _)) if matches!(prefix, "http" | "mailto" | "file") => {
                Ok(qname.to_owned())
            }
            Some(_) => Ok(self.qname_to_uri(qname)?.unwrap_or_else(|| qname.to_owned())),
        }
    }

    pub(crate) fn del_source_triples(&mut self, source: NodeId) -> StoreResult<()> {
        for table in ["DELETE FROM cache.triple", "DELETE FROM triple"] {
            let mut sql = String::from(table);
            TriplePattern::any().with_source(source).push_where(&mut sql);
            self.db
                .connection()
                .execute(&sql, [])
                .map_err(StoreError::SourceDelete)?;
        }
        Ok(())
    }

    fn del_source(&mut self, source: NodeId) -> StoreResult<()> {
        self.transaction()?;
        match self.del_source_body(source) {
            Ok(()) => self.commit(),
            Err(e) => {
                let _ = self.rollback();
                Err(e)
            }
        }
    }

    fn del_source_body(&mut self, source: NodeId) -> StoreResult<()> {
        self.del_source_triples(source)?;
        self.db
            .connection()
            .execute("DELETE FROM source WHERE src = ?1", [source])
            .map_err(StoreError::SourceDelete)?;
        Ok(())
    }

    fn all_sources(&mut self) -> StoreResult<Vec<NodeId>> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare("SELECT src FROM source")
            .map_err(StoreError::SourceQuery)?;
        let sources = stmt
            .query_map([], |row| row.get(0))
            .map_err(StoreError::SourceQuery)?
            .collect::<Result<Vec<NodeId>, _>>()
            .map_err(StoreError::SourceQuery)?;
        Ok(sources)
    }

    pub(crate) fn transaction(&mut self) -> StoreResult<()> {
        self.db.exec_batch("BEGIN").map_err(StoreError::Transaction)
    }

    pub(crate) fn commit(&mut self) -> StoreResult<()> {
        self.db.exec_batch("COMMIT").map_err(StoreError::Transaction)
    }

    pub(crate) fn rollback(&mut self) -> StoreResult<()> {
        self.db
            .exec_batch("ROLLBACK")
            .map_err(StoreError::Transaction)
    }
}
