//! AQL list-form parser
//!
//! Hand-written reader over the S-expression surface syntax. The grammar is
//! character-level and every error carries the `(line, column)` of the
//! current read position, so the reader tracks positions itself instead of
//! going through a generated lexer.
//!
//! Whitespace is space, tab, CR, LF; `\r\n` and `\n\r` count as a single
//! newline. Keywords are maximal runs of non-whitespace, non-parenthesis
//! characters. Strings support the `\n`, `\r`, `\\`, `\"` escapes; `\x`,
//! `\u` and `\U` are reserved.

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

use crate::model::{CompareOp, Expr, Join, JoinKind, JunctionKind, Query, Select, Sort, TriplePart};

/// Result type for parser operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse error with the position of the current read position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line} column {column}: {message}")]
pub struct ParseError {
    /// 1-based line of the read position
    pub line: u32,
    /// 1-based column of the read position
    pub column: u32,
    /// Description of the failure
    pub message: String,
}

/// Parse one AQL query from its list surface form.
///
/// The input must contain exactly one `(aql-query …)` form, optionally
/// surrounded by whitespace.
pub fn parse_query(input: &str) -> ParseResult<Query> {
    let mut reader = Reader::new(input);
    let query = reader.parse_aql_query()?;
    reader.skip_whitespace();
    reader.expect_eof()?;
    Ok(query)
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_keyword_char(c: char) -> bool {
    !is_whitespace(c) && c != '(' && c != ')'
}

fn is_string_char(c: char) -> bool {
    c >= '\u{20}' && c != '"'
}

/// Render a character for an error message, hex-escaping the unprintable
fn visible(c: char) -> String {
    let code = c as u32;
    if (0x20..0x7f).contains(&code) {
        c.to_string()
    } else {
        format!("\\x{code:02x}")
    }
}

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    column: u32,
    // Used to fold "\r\n" and "\n\r" into one newline.
    last: char,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            last: '\0',
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn get(&mut self) -> ParseResult<char> {
        let Some(c) = self.chars.next() else {
            return Err(self.error("Unexpected end of file"));
        };
        if (c == '\r' && self.last != '\n') || (c == '\n' && self.last != '\r') {
            self.line += 1;
        }
        if c == '\r' || c == '\n' {
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.last = c;
        Ok(c)
    }

    fn expect_eof(&mut self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("Expected EOF but got '{}'", visible(c)))),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !is_whitespace(c) {
                return;
            }
            let _ = self.get();
        }
    }

    fn expect_char(&mut self, expected: char) -> ParseResult<()> {
        let got = self.get()?;
        if got != expected {
            return Err(self.error(format!(
                "Unexpected character '{}'. Expected '{}'",
                visible(got),
                visible(expected)
            )));
        }
        Ok(())
    }

    fn expect_keyword(&mut self, expected: &str) -> ParseResult<()> {
        let keyword = self.read_keyword();
        if keyword != expected {
            return Err(self.error(format!("Expected keyword '{expected}'")));
        }
        Ok(())
    }

    fn read_keyword(&mut self) -> String {
        let mut keyword = String::new();
        while let Some(c) = self.peek() {
            if !is_keyword_char(c) {
                break;
            }
            keyword.push(c);
            let _ = self.get();
        }
        keyword
    }

    fn read_string(&mut self) -> ParseResult<String> {
        let mut value = String::new();
        self.expect_char('"')?;
        while self.peek().is_some_and(is_string_char) {
            let mut c = self.get()?;
            if c == '\\' {
                c = self.get()?;
                match c {
                    'n' => c = '\n',
                    'r' => c = '\r',
                    '\\' | '"' => {}
                    'x' => return Err(self.error("\\x escape not implemented")),
                    'u' => return Err(self.error("\\u escape not implemented")),
                    'U' => return Err(self.error("\\U escape not implemented")),
                    other => return Err(self.error(format!("Bad escape \\{other}"))),
                }
            }
            value.push(c);
        }
        self.expect_char('"')?;
        Ok(value)
    }

    fn read_int(&mut self) -> ParseResult<i32> {
        let token = self.read_keyword();
        let Ok(value) = token.parse::<i128>() else {
            return Err(self.error(format!("Bad integer value {token}")));
        };
        if value > i32::MAX as i128 || value < i32::MIN as i128 {
            return Err(self.error(format!(
                "Number out of range: {token}. Must be within [{}, {}]",
                i32::MIN,
                i32::MAX
            )));
        }
        Ok(value as i32)
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.skip_whitespace();
        self.expect_char('(')?;
        self.skip_whitespace();
        let keyword = self.read_keyword();
        let expr = match keyword.as_str() {
            "literal" => {
                self.skip_whitespace();
                Expr::Literal(self.read_string()?)
            }
            "property" => {
                self.skip_whitespace();
                let join = self.read_string()?;
                self.skip_whitespace();
                let part_keyword = self.read_keyword();
                let part = match part_keyword.as_str() {
                    "subject" => TriplePart::Subject,
                    "predicate" => TriplePart::Predicate,
                    "object" => TriplePart::Object,
                    other => {
                        return Err(self.error(format!(
                            "Expected node part keyword (subject, predicate or object) \
                             but got \"{other}\""
                        )))
                    }
                };
                Expr::Property { join, part }
            }
            "function" => {
                self.skip_whitespace();
                let name = self.read_string()?;
                let mut args = Vec::new();
                loop {
                    self.skip_whitespace();
                    if self.peek() == Some('(') {
                        args.push(self.parse_expr()?);
                    } else {
                        break;
                    }
                }
                Expr::Function { name, args }
            }
            "comp-eq" => Expr::Comparison {
                op: CompareOp::Eq,
                left: Box::new(self.parse_expr()?),
                right: Box::new(self.parse_expr()?),
            },
            "comp-ne" => Expr::Comparison {
                op: CompareOp::Ne,
                left: Box::new(self.parse_expr()?),
                right: Box::new(self.parse_expr()?),
            },
            "and" | "or" => {
                let kind = if keyword == "and" {
                    JunctionKind::And
                } else {
                    JunctionKind::Or
                };
                let mut terms = Vec::new();
                self.skip_whitespace();
                while self.peek() == Some('(') {
                    terms.push(self.parse_criterion()?);
                    self.skip_whitespace();
                }
                Expr::Junction { kind, terms }
            }
            "not" => Expr::Not(Box::new(self.parse_expr()?)),
            other => {
                return Err(self.error(format!("Expected: expression keyword but got \"{other}\"")))
            }
        };
        self.skip_whitespace();
        self.expect_char(')')?;
        Ok(expr)
    }

    fn parse_criterion(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_expr()?;
        if expr.is_logical() {
            return Ok(expr);
        }
        Err(self.error(format!(
            "Expected logical expression but got {} expression",
            expr.type_name()
        )))
    }

    fn parse_aql_query(&mut self) -> ParseResult<Query> {
        let mut query = Query::default();
        self.skip_whitespace();
        self.expect_char('(')?;
        self.skip_whitespace();
        self.expect_keyword("aql-query")?;
        self.skip_whitespace();

        while self.peek() == Some('(') {
            self.get()?; // consumes the peeked '('
            self.skip_whitespace();
            let keyword = self.read_keyword();
            match keyword.as_str() {
                "select" => {
                    self.skip_whitespace();
                    let label = self.read_string()?;
                    let expr = self.parse_expr()?;
                    query.selects.push(Select { label, expr });
                }
                "join" => {
                    self.skip_whitespace();
                    let kind_keyword = self.read_keyword();
                    let kind = match kind_keyword.as_str() {
                        "left" => JoinKind::LeftOuter,
                        "inner" => JoinKind::Inner,
                        other => {
                            return Err(self.error(format!(
                                "Bad join type '{other}'. Expected 'left' or 'inner'"
                            )))
                        }
                    };
                    self.skip_whitespace();
                    let name = self.read_string()?;
                    self.skip_whitespace();
                    let criterion = self.parse_criterion()?;
                    query.joins.push(Join {
                        name,
                        kind,
                        criterion,
                    });
                }
                "criterion" => {
                    let criterion = self.parse_criterion()?;
                    // Multiple criterion clauses combine by implicit
                    // conjunction: extend a root conjunction in place, or
                    // wrap the previous root in a new one.
                    query.criterion = Some(match query.criterion.take() {
                        None => criterion,
                        Some(Expr::Junction {
                            kind: JunctionKind::And,
                            mut terms,
                        }) => {
                            terms.push(criterion);
                            Expr::Junction {
                                kind: JunctionKind::And,
                                terms,
                            }
                        }
                        Some(previous) => Expr::Junction {
                            kind: JunctionKind::And,
                            terms: vec![previous, criterion],
                        },
                    });
                }
                "sort" => {
                    self.skip_whitespace();
                    let direction = self.read_keyword();
                    let ascending = match direction.as_str() {
                        "ascending" => true,
                        "descending" => false,
                        other => {
                            return Err(self.error(format!(
                                "Bad sort direction '{other}'. \
                                 Expected 'ascending' or 'descending'"
                            )))
                        }
                    };
                    self.skip_whitespace();
                    let expr = self.parse_expr()?;
                    query.sorts.push(Sort { ascending, expr });
                }
                "result-max-rows" => {
                    self.skip_whitespace();
                    let max_rows = self.read_int()?;
                    if max_rows < 0 {
                        return Err(self.error("Expected non-negative numeric value"));
                    }
                    query.max_rows = max_rows;
                }
                "result-row-offset" => {
                    self.skip_whitespace();
                    let offset = self.read_int()?;
                    if offset < 0 {
                        return Err(self.error("Expected non-negative numeric value"));
                    }
                    query.row_offset = offset;
                }
                _ => {
                    return Err(self.error(
                        "Expected: select, join, criterion, sort, result-max-rows, \
                         result-row-offset or ')'",
                    ))
                }
            }
            self.skip_whitespace();
            self.expect_char(')')?; // matches the clause
            self.skip_whitespace();
        }
        self.expect_char(')')?; // matches aql-query
        self.skip_whitespace();
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_accounting_folds_crlf() {
        // The error position is measured after the \r\n pair: one newline.
        let err = parse_query("(aql-query\r\n  ?").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_visible_escapes_control_characters() {
        assert_eq!(visible('a'), "a");
        assert_eq!(visible('\t'), "\\x09");
        assert_eq!(visible('\u{7f}'), "\\x7f");
    }

    #[test]
    fn test_string_escapes() {
        let q = parse_query("(aql-query (select \"a\\n\\r\\\\\\\"b\" (literal \"x\")))").unwrap();
        assert_eq!(q.selects[0].label, "a\n\r\\\"b");
    }

    #[test]
    fn test_reserved_escapes_fail() {
        for escape in ["\\x41", "\\u0041", "\\U00000041"] {
            let input = format!("(aql-query (select \"{escape}\" (literal \"x\")))");
            let err = parse_query(&input).unwrap_err();
            assert!(err.message.contains("not implemented"), "{}", err.message);
        }
    }

    #[test]
    fn test_bad_escape() {
        let err = parse_query("(aql-query (select \"\\q\" (literal \"x\")))").unwrap_err();
        assert_eq!(err.message, "Bad escape \\q");
    }

    #[test]
    fn test_int_out_of_range() {
        let err = parse_query("(aql-query (result-max-rows 2147483648))").unwrap_err();
        assert!(err.message.starts_with("Number out of range: 2147483648"));
        let ok = parse_query("(aql-query (result-max-rows 2147483647))").unwrap();
        assert_eq!(ok.max_rows, i32::MAX);
    }

    #[test]
    fn test_bad_integer() {
        let err = parse_query("(aql-query (result-max-rows 12x))").unwrap_err();
        assert_eq!(err.message, "Bad integer value 12x");
    }
}
