//! The source load protocol
//!
//! Loading pulls triples from a named source into the persistent layer
//! through two external collaborators, both behind traits: the ingestion
//! parser ([`RdfReader`]) and the modification-time oracle
//! ([`SourceClock`]). The store side of the exchange is a [`TripleSink`]
//! scoped to the loading source.
//!
//! The protocol: look up the source registry, decide whether a reload is
//! needed, then run the reader inside a transaction with the blank-node
//! table cleared around the parse. Reader termination rolls back and reports
//! failure; storage faults roll back and unwind.

use rusqlite::{params, OptionalExtension};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::node::{NodeId, Triple};
use crate::store::{Store, StoreInner};

/// Result type for reader passes
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Why a load's reader pass did not complete
#[derive(Debug, Error)]
pub enum LoadError {
    /// The ingestion parser terminated abnormally. The load rolls back and
    /// reports failure without raising.
    #[error("parser terminated: {0}")]
    Terminated(String),

    /// A storage fault. The load rolls back and unwinds to the caller.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a load reads from
#[derive(Clone, Copy, Debug)]
pub enum LoadInput<'a> {
    /// Fetch from the source URI itself
    Remote,
    /// Parse inline content
    Inline(&'a str),
    /// Run an external command and parse its standard output
    Script {
        /// Program to run
        command: &'a str,
        /// Program arguments
        args: &'a [String],
    },
}

/// Modification-time oracle for source URIs.
///
/// A time of `0` means "unknown"; the skip-load policy treats unknown as
/// "not newer than what is stored".
pub trait SourceClock {
    /// Remote modification time of `uri`, as seconds since the epoch
    fn modification_time(&self, uri: &str) -> StoreResult<i64>;
}

/// Filesystem modification times for `file:` URIs and plain paths.
pub struct FsClock;

impl SourceClock for FsClock {
    fn modification_time(&self, uri: &str) -> StoreResult<i64> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        let fetch_err = |reason: String| StoreError::Fetch {
            uri: uri.to_owned(),
            reason,
        };
        let metadata = std::fs::metadata(path).map_err(|e| fetch_err(e.to_string()))?;
        let modified = metadata.modified().map_err(|e| fetch_err(e.to_string()))?;
        Ok(modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0))
    }
}

/// Store-side surface the ingestion parser writes through.
///
/// Assertions are tagged with the loading source and run through the
/// RDF/RDFS post-process rule.
pub trait TripleSink {
    /// Intern a URI-named resource
    fn resource(&mut self, uri: &str) -> StoreResult<NodeId>;
    /// Allocate a fresh anonymous resource
    fn anonymous(&mut self) -> StoreResult<NodeId>;
    /// Intern a blank node, reusing the label within this parse session
    fn blank(&mut self, label: &str) -> StoreResult<NodeId>;
    /// Intern a literal
    fn literal(&mut self, text: &str, datatype: NodeId, lang: Option<&str>)
        -> StoreResult<NodeId>;
    /// Register a namespace prefix seen in the input
    fn namespace(&mut self, prefix: &str, uri: &str) -> StoreResult<()>;
    /// Assert a triple from the input
    fn assert(&mut self, s: NodeId, p: NodeId, o: NodeId) -> StoreResult<()>;
}

/// External ingestion parser emitting `(s, p, o)` tuples into a sink.
pub trait RdfReader {
    /// Parse the input for `uri`, writing everything through `sink`
    fn read(
        &mut self,
        uri: &str,
        input: &LoadInput<'_>,
        sink: &mut dyn TripleSink,
    ) -> LoadResult<()>;
}

struct LoadSession<'a> {
    inner: &'a mut StoreInner,
    source: NodeId,
}

impl TripleSink for LoadSession<'_> {
    fn resource(&mut self, uri: &str) -> StoreResult<NodeId> {
        self.inner.node(Some(uri), false)
    }

    fn anonymous(&mut self) -> StoreResult<NodeId> {
        self.inner.node(None, false)
    }

    fn blank(&mut self, label: &str) -> StoreResult<NodeId> {
        self.inner.node(Some(label), true)
    }

    fn literal(
        &mut self,
        text: &str,
        datatype: NodeId,
        lang: Option<&str>,
    ) -> StoreResult<NodeId> {
        self.inner.literal(text, datatype, lang)
    }

    fn namespace(&mut self, prefix: &str, uri: &str) -> StoreResult<()> {
        self.inner.add_namespace(prefix, uri)?;
        Ok(())
    }

    fn assert(&mut self, s: NodeId, p: NodeId, o: NodeId) -> StoreResult<()> {
        let triple = Triple::new(s, p, o);
        self.inner.add(&triple, self.source, false)?;
        self.inner.add_post_process(&triple)?;
        Ok(())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Store {
    /// Load a source's triples through an ingestion parser.
    ///
    /// With `append = false` the source's previous persistent triples are
    /// replaced. Returns `Ok(false)` when the fetcher or the parser failed
    /// (the transaction is rolled back); unrecoverable storage faults raise.
    pub fn load(
        &self,
        source: NodeId,
        input: &LoadInput<'_>,
        append: bool,
        reader: &mut dyn RdfReader,
        clock: &dyn SourceClock,
    ) -> StoreResult<bool> {
        self.lock_inner().load(source, input, append, reader, clock)
    }
}

impl StoreInner {
    pub(crate) fn load(
        &mut self,
        source: NodeId,
        input: &LoadInput<'_>,
        append: bool,
        reader: &mut dyn RdfReader,
        clock: &dyn SourceClock,
    ) -> StoreResult<bool> {
        let uri = self.info(source)?.text.unwrap_or_default();
        info!(%uri, "loading");

        let old_time: Option<i64> = self
            .db
            .connection()
            .query_row(
                "SELECT created FROM source WHERE src = ?1 LIMIT 1",
                [source],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::SourceFind)?;
        let known = old_time.is_some();

        let mut new_time = 0i64; // 0 means unknown
        if matches!(input, LoadInput::Remote) {
            match clock.modification_time(&uri) {
                Ok(t) => new_time = t,
                Err(e) => {
                    warn!(error = %e, "load failed: fetcher error");
                    return Ok(false);
                }
            }
            if let Some(old) = old_time {
                if new_time == 0 || new_time <= old {
                    info!(%uri, "no reload needed");
                    return Ok(true);
                }
            }
        }

        // Script input becomes inline content produced by the external
        // command; a spawn failure or non-zero exit terminates the load.
        let script_output = match input {
            LoadInput::Script { command, args } => {
                let output = Command::new(command).args(args.iter()).output().map_err(|e| {
                    StoreError::Fetch {
                        uri: uri.clone(),
                        reason: format!("script {command}: {e}"),
                    }
                })?;
                if !output.status.success() {
                    warn!(%command, status = %output.status, "load failed: script error");
                    return Ok(false);
                }
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            _ => None,
        };
        let effective = match &script_output {
            Some(content) => LoadInput::Inline(content),
            None => *input,
        };

        self.transaction()?;
        let outcome = self.run_load(source, &uri, &effective, append, reader, known, new_time);
        match outcome {
            Ok(()) => {
                self.clear_bnodes()?;
                info!(%uri, "loaded");
                Ok(true)
            }
            Err(LoadError::Terminated(message)) => {
                self.rollback()?;
                self.clear_bnodes()?;
                warn!(%message, "load failed: parser terminated");
                Ok(false)
            }
            Err(LoadError::Store(e)) => {
                let _ = self.rollback();
                let _ = self.clear_bnodes();
                Err(e)
            }
        }
    }

    fn run_load(
        &mut self,
        source: NodeId,
        uri: &str,
        input: &LoadInput<'_>,
        append: bool,
        reader: &mut dyn RdfReader,
        known: bool,
        new_time: i64,
    ) -> LoadResult<()> {
        self.clear_bnodes()?;
        if !append {
            self.del_source_triples(source)?;
        }
        {
            let mut session = LoadSession {
                inner: self,
                source,
            };
            reader.read(uri, input, &mut session)?;
        }
        let now = unix_now();
        if known {
            self.db
                .connection()
                .execute(
                    "UPDATE source SET loaded = ?1, created = ?2 WHERE src = ?3",
                    params![now, new_time, source],
                )
                .map_err(StoreError::SourceTime)?;
        } else {
            self.db
                .connection()
                .execute(
                    "INSERT INTO source VALUES (?1, ?2, ?3)",
                    params![source, new_time, now],
                )
                .map_err(StoreError::SourceTime)?;
        }
        self.commit()?;
        Ok(())
    }

    fn clear_bnodes(&mut self) -> StoreResult<()> {
        self.db
            .connection()
            .execute("DELETE FROM cache.bnode", [])
            .map_err(StoreError::Sql)?;
        Ok(())
    }
}
