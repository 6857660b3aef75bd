//! AQL to SQL translation
//!
//! Two passes over the query tree. The planning pass assigns `t0, t1, …`
//! aliases to triple joins (the root first, then joins in declaration
//! order) and records which `(join, part)` pairs need a join to the node
//! dictionary. The emission pass produces the SQL text; node-join aliases
//! may only be looked up then, never created, so an undeclared alias is an
//! internal error rather than silent bad SQL.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use crate::model::{CompareOp, Expr, JoinKind, JunctionKind, Query, TriplePart, ROOT_JOIN};

/// Result type for translation
pub type TranslateResult<T> = std::result::Result<T, TranslateError>;

/// Errors raised while lowering AQL to SQL
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A function name not present in the function table
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A property reference to a triple join that was never planned
    #[error("internal error: no alias for join \"{0}\"")]
    MissingJoin(String),

    /// A property value whose node join was never declared
    #[error("internal error: no alias for {join}.{column}")]
    MissingNodeJoin {
        /// Triple join name
        join: String,
        /// Triple column character
        column: char,
    },
}

type Formatter = fn(&[String]) -> String;

enum SqlFunction {
    /// Identity lowering to a SQL function of the given name
    Named(&'static str),
    /// Custom assembly from the rendered argument fragments
    Custom(Formatter),
}

// NOTE: THESE MUST BE IN ALPHABETICAL ORDER (binary searched).
const FUNCTION_TABLE: &[(&str, SqlFunction)] = &[
    ("abs", SqlFunction::Named("abs")),
    ("coalesce", SqlFunction::Named("coalesce")),
    ("concatenate", SqlFunction::Custom(format_concatenate)),
    ("length", SqlFunction::Named("length")),
    ("random", SqlFunction::Named("random")),
    ("to-lower", SqlFunction::Named("lower")),
    ("to-upper", SqlFunction::Named("upper")),
    ("type-of", SqlFunction::Named("typeof")),
];

fn find_function(name: &str) -> Option<&'static SqlFunction> {
    FUNCTION_TABLE
        .binary_search_by(|(entry, _)| entry.cmp(&name))
        .ok()
        .map(|index| &FUNCTION_TABLE[index].1)
}

fn format_named(name: &str, args: &[String]) -> String {
    format!("{name}({})", args.join(", "))
}

fn format_concatenate(args: &[String]) -> String {
    if args.is_empty() {
        return "''".to_string();
    }
    let mut out = String::from("(");
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            out.push_str(" || ");
        }
        out.push('(');
        out.push_str(arg);
        out.push(')');
    }
    out.push(')');
    out
}

/// Alias plan: triple join aliases plus declared node joins.
struct Planner {
    aliases: FxHashMap<String, String>,
    next_alias: usize,
    node_joins: FxHashMap<String, BTreeSet<TriplePart>>,
}

impl Planner {
    fn new() -> Self {
        Self {
            aliases: FxHashMap::default(),
            next_alias: 0,
            node_joins: FxHashMap::default(),
        }
    }

    /// Assign (or fetch) the triple alias for a join name. Planning only.
    fn triple_alias(&mut self, join: &str) {
        if !self.aliases.contains_key(join) {
            let alias = format!("t{}", self.next_alias);
            self.next_alias += 1;
            self.aliases.insert(join.to_owned(), alias);
        }
    }

    /// Declare a node join for a property value. Planning only.
    fn declare_node_join(&mut self, join: &str, part: TriplePart) {
        self.triple_alias(join);
        self.node_joins
            .entry(join.to_owned())
            .or_default()
            .insert(part);
    }

    /// Emission-time lookup of a triple alias.
    fn lookup_triple_alias(&self, join: &str) -> TranslateResult<&str> {
        self.aliases
            .get(join)
            .map(String::as_str)
            .ok_or_else(|| TranslateError::MissingJoin(join.to_owned()))
    }

    /// Emission-time lookup of a declared node-join alias.
    fn lookup_node_join(&self, join: &str, part: TriplePart) -> TranslateResult<String> {
        let declared = self
            .node_joins
            .get(join)
            .is_some_and(|parts| parts.contains(&part));
        if !declared {
            return Err(TranslateError::MissingNodeJoin {
                join: join.to_owned(),
                column: part.column(),
            });
        }
        let alias = self.lookup_triple_alias(join)?;
        Ok(format!("{alias}_{}", part.column()))
    }

    fn declared_parts(&self, join: &str) -> Option<&BTreeSet<TriplePart>> {
        self.node_joins.get(join)
    }
}

fn plan_expr(planner: &mut Planner, expr: &Expr) {
    match expr {
        Expr::Property { join, part } => planner.declare_node_join(join, *part),
        Expr::PropertyRef { .. } | Expr::Literal(_) => {}
        Expr::Function { args, .. } => {
            for arg in args {
                plan_expr(planner, arg);
            }
        }
        Expr::Comparison { left, right, .. } => {
            plan_expr(planner, left);
            plan_expr(planner, right);
        }
        Expr::Junction { terms, .. } => {
            for term in terms {
                plan_expr(planner, term);
            }
        }
        Expr::Not(inner) => plan_expr(planner, inner),
    }
}

/// Translate a query into SQL against the `triple`/`node` schema.
pub fn translate(query: &Query) -> TranslateResult<String> {
    let mut planner = Planner::new();
    planner.triple_alias(ROOT_JOIN);
    for join in &query.joins {
        planner.triple_alias(&join.name);
    }
    for select in &query.selects {
        plan_expr(&mut planner, &select.expr);
    }
    for join in &query.joins {
        plan_expr(&mut planner, &join.criterion);
    }
    if let Some(criterion) = &query.criterion {
        plan_expr(&mut planner, criterion);
    }
    for sort in &query.sorts {
        plan_expr(&mut planner, &sort.expr);
    }

    let mut sql = String::from("SELECT");
    for (index, select) in query.selects.iter().enumerate() {
        sql.push_str(if index == 0 { " " } else { ", " });
        emit_expr(&planner, &mut sql, &select.expr)?;
        sql.push_str(" AS col");
        sql.push_str(&index.to_string());
    }

    sql.push_str("\n  FROM triple AS ");
    sql.push_str(planner.lookup_triple_alias(ROOT_JOIN)?);
    emit_node_joins(&planner, &mut sql, ROOT_JOIN, JoinKind::Inner)?;

    for join in &query.joins {
        sql.push_str(match join.kind {
            JoinKind::LeftOuter => "\n  LEFT  JOIN triple AS ",
            JoinKind::Inner => "\n  INNER JOIN triple AS ",
        });
        sql.push_str(planner.lookup_triple_alias(&join.name)?);
        sql.push_str(" ON (");
        emit_expr(&planner, &mut sql, &join.criterion)?;
        sql.push(')');
        emit_node_joins(&planner, &mut sql, &join.name, join.kind)?;
    }

    if let Some(criterion) = &query.criterion {
        sql.push_str("\n WHERE ");
        emit_expr(&planner, &mut sql, criterion)?;
    }

    if !query.sorts.is_empty() {
        sql.push_str("\nORDER BY ");
        for (index, sort) in query.sorts.iter().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            emit_expr(&planner, &mut sql, &sort.expr)?;
            sql.push_str(if sort.ascending { " ASC" } else { " DESC" });
        }
    }

    if query.max_rows >= 0 || query.row_offset >= 0 {
        sql.push_str("\nLIMIT ");
        if query.row_offset >= 0 {
            sql.push_str(&query.row_offset.to_string());
            sql.push_str(", ");
        }
        if query.max_rows >= 0 {
            sql.push_str(&query.max_rows.to_string());
        } else {
            // Offset without a row bound: stand in the maximum.
            sql.push_str(&i32::MAX.to_string());
        }
    }

    debug!(sql = %sql, "translated query");
    Ok(sql)
}

fn emit_node_joins(
    planner: &Planner,
    sql: &mut String,
    join: &str,
    kind: JoinKind,
) -> TranslateResult<()> {
    let Some(parts) = planner.declared_parts(join) else {
        return Ok(());
    };
    let alias = planner.lookup_triple_alias(join)?;
    for part in parts {
        let column = part.column();
        sql.push_str("\n     ");
        sql.push_str(match kind {
            JoinKind::LeftOuter => "LEFT ",
            JoinKind::Inner => "INNER",
        });
        sql.push_str(" JOIN node AS ");
        sql.push_str(alias);
        sql.push('_');
        sql.push(column);
        sql.push_str(" ON (");
        sql.push_str(alias);
        sql.push('.');
        sql.push(column);
        sql.push('=');
        sql.push_str(alias);
        sql.push('_');
        sql.push(column);
        sql.push_str(".id)");
    }
    Ok(())
}

fn emit_expr(planner: &Planner, sql: &mut String, expr: &Expr) -> TranslateResult<()> {
    match expr {
        Expr::Literal(value) => {
            sql.push('\'');
            for c in value.chars() {
                if c == '\'' {
                    sql.push('\'');
                }
                sql.push(c);
            }
            sql.push('\'');
        }
        Expr::Property { join, part } => {
            sql.push_str(&planner.lookup_node_join(join, *part)?);
            sql.push_str(".str");
        }
        Expr::PropertyRef { join, part } => {
            sql.push_str(planner.lookup_triple_alias(join)?);
            sql.push('.');
            sql.push(part.column());
        }
        Expr::Function { name, args } => {
            let function =
                find_function(name).ok_or_else(|| TranslateError::UnknownFunction(name.clone()))?;
            let mut rendered = Vec::with_capacity(args.len());
            for arg in args {
                let mut buffer = String::new();
                emit_expr(planner, &mut buffer, arg)?;
                rendered.push(buffer);
            }
            match function {
                SqlFunction::Named(sql_name) => sql.push_str(&format_named(sql_name, &rendered)),
                SqlFunction::Custom(format) => sql.push_str(&format(&rendered)),
            }
        }
        Expr::Comparison { op, left, right } => {
            sql.push('(');
            emit_expr(planner, sql, left)?;
            sql.push_str(match op {
                CompareOp::Eq => "=",
                CompareOp::Ne => "<>",
            });
            emit_expr(planner, sql, right)?;
            sql.push(')');
        }
        Expr::Junction { kind, terms } => {
            sql.push('(');
            if terms.is_empty() {
                sql.push_str(match kind {
                    JunctionKind::And => "1=1",
                    JunctionKind::Or => "0=1",
                });
            } else {
                for (index, term) in terms.iter().enumerate() {
                    if index > 0 {
                        sql.push_str(match kind {
                            JunctionKind::And => " AND ",
                            JunctionKind::Or => " OR ",
                        });
                    }
                    emit_expr(planner, sql, term)?;
                }
            }
            sql.push(')');
        }
        Expr::Not(inner) => {
            sql.push_str("NOT ");
            emit_expr(planner, sql, inner)?;
        }
    }
    Ok(())
}
