//! AQL tree printer
//!
//! Renders a query back to its canonical list surface form. For every tree
//! in the parser's image, `parse_query(print_query(q))` reproduces `q`
//! structurally; strings are re-escaped, comparisons print with the
//! parser's `comp-eq`/`comp-ne` spelling, and join clauses include their
//! name.

use crate::model::{CompareOp, Expr, JoinKind, JunctionKind, Query};

/// Print a query in canonical list form.
pub fn print_query(query: &Query) -> String {
    let mut out = String::from("(aql-query\n");
    for select in &query.selects {
        out.push_str("  (select ");
        push_string(&mut out, &select.label);
        push_expr(&mut out, &select.expr);
        out.push_str(")\n");
    }
    for join in &query.joins {
        out.push_str("  (join ");
        out.push_str(match join.kind {
            JoinKind::Inner => "inner",
            JoinKind::LeftOuter => "left",
        });
        out.push(' ');
        push_string(&mut out, &join.name);
        push_expr(&mut out, &join.criterion);
        out.push_str(")\n");
    }
    if let Some(criterion) = &query.criterion {
        out.push_str("  (criterion");
        push_expr(&mut out, criterion);
        out.push_str(")\n");
    }
    for sort in &query.sorts {
        out.push_str("  (sort ");
        out.push_str(if sort.ascending { "ascending" } else { "descending" });
        push_expr(&mut out, &sort.expr);
        out.push_str(")\n");
    }
    if query.max_rows >= 0 {
        out.push_str("  (result-max-rows ");
        out.push_str(&query.max_rows.to_string());
        out.push_str(")\n");
    }
    if query.row_offset >= 0 {
        out.push_str("  (result-row-offset ");
        out.push_str(&query.row_offset.to_string());
        out.push_str(")\n");
    }
    out.push_str(")\n");
    out
}

fn push_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal(value) => {
            out.push_str(" (literal ");
            push_string(out, value);
            out.push(')');
        }
        Expr::Property { join, part } => {
            out.push_str(" (property ");
            push_string(out, join);
            out.push(' ');
            out.push_str(part.keyword());
            out.push(')');
        }
        Expr::PropertyRef { join, part } => {
            out.push_str(" (property-ref ");
            push_string(out, join);
            out.push(' ');
            out.push_str(part.keyword());
            out.push(')');
        }
        Expr::Function { name, args } => {
            out.push_str(" (function ");
            push_string(out, name);
            for arg in args {
                push_expr(out, arg);
            }
            out.push(')');
        }
        Expr::Comparison { op, left, right } => {
            out.push_str(match op {
                CompareOp::Eq => " (comp-eq",
                CompareOp::Ne => " (comp-ne",
            });
            push_expr(out, left);
            push_expr(out, right);
            out.push(')');
        }
        Expr::Junction { kind, terms } => {
            out.push_str(match kind {
                JunctionKind::And => " (and",
                JunctionKind::Or => " (or",
            });
            for term in terms {
                push_expr(out, term);
            }
            out.push(')');
        }
        Expr::Not(inner) => {
            out.push_str(" (not");
            push_expr(out, inner);
            out.push(')');
        }
    }
}

fn push_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
