//! Wildcard triple patterns

use crate::node::{NodeId, Triple, NULL_NODE};

/// Pattern for matching stored triples.
///
/// `NULL_NODE` in any position means "match any". Bound positions contribute
/// `col = id` terms to the generated `WHERE` clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriplePattern {
    /// Subject position, `NULL_NODE` for any
    pub subject: NodeId,
    /// Predicate position, `NULL_NODE` for any
    pub predicate: NodeId,
    /// Object position, `NULL_NODE` for any
    pub object: NodeId,
    /// Provenance source, `NULL_NODE` for any
    pub source: NodeId,
}

impl TriplePattern {
    /// Create a pattern over the three triple positions, any source
    pub fn new(subject: NodeId, predicate: NodeId, object: NodeId) -> Self {
        Self {
            subject,
            predicate,
            object,
            source: NULL_NODE,
        }
    }

    /// Restrict the pattern to one provenance source
    pub fn with_source(mut self, source: NodeId) -> Self {
        self.source = source;
        self
    }

    /// Pattern that matches every triple
    pub fn any() -> Self {
        Self::new(NULL_NODE, NULL_NODE, NULL_NODE)
    }

    /// Count how many positions are bound (not wildcards)
    pub fn bound_count(&self) -> usize {
        [self.subject, self.predicate, self.object, self.source]
            .iter()
            .filter(|id| !id.is_null())
            .count()
    }

    /// Check if this is an all-wildcard pattern
    pub fn is_wildcard(&self) -> bool {
        self.bound_count() == 0
    }

    /// Append the `WHERE` clause selecting this pattern to `sql`.
    ///
    /// A fully wildcard pattern appends nothing. Ids are numeric, so they are
    /// emitted inline.
    pub(crate) fn push_where(&self, sql: &mut String) {
        let mut separator = " WHERE ";
        let columns = [
            ("s", self.subject),
            ("p", self.predicate),
            ("o", self.object),
            ("src", self.source),
        ];
        for (column, id) in columns {
            if !id.is_null() {
                sql.push_str(separator);
                sql.push_str(column);
                sql.push('=');
                sql.push_str(&id.0.to_string());
                separator = " AND ";
            }
        }
    }
}

impl From<Triple> for TriplePattern {
    fn from(t: Triple) -> Self {
        Self::new(t.subject, t.predicate, t.object)
    }
}

impl Default for TriplePattern {
    fn default() -> Self {
        Self::any()
    }
}
