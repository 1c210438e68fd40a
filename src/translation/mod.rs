//! Named-placeholder translation.
//!
//! Statement fragments are written with `:name` placeholders. Before a
//! statement reaches a backend, the placeholders are rewritten into the
//! backend's own style and the bound names are listed in binding order.

use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    BLOCK_CLOSE, BLOCK_OPEN, CAST, LINE_COMMENT, at_pair, closes_dollar_quote, dollar_quote_opener,
};
use scanner::{State, scan_identifier};

use crate::dialect::Dialect;

/// Placeholder style a backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?1`, `?2`, ...; a repeated name reuses its number.
    Numbered,
    /// `$1`, `$2`, ...; a repeated name reuses its number.
    Dollar,
    /// Bare `?`; a repeated name is bound again at each occurrence.
    Positional,
    /// `:name` kept as written.
    Named,
}

/// SQL rewritten for a backend plus the placeholder names in binding order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated<'a> {
    pub sql: Cow<'a, str>,
    pub names: Vec<String>,
}

/// Rewrite `:name` placeholders for `dialect`.
///
/// String literals, quoted identifiers, comments, dollar-quoted bodies
/// (`PostgreSQL` only) and `::` casts are skipped. Returns a borrowed `Cow`
/// when nothing needed rewriting.
///
/// ```rust
/// use sql_silo::prelude::*;
///
/// let out = translate_named("SELECT * FROM t WHERE a = :p_0 OR b = :p_0", Dialect::Postgres);
/// assert_eq!(out.sql, "SELECT * FROM t WHERE a = $1 OR b = $1");
/// assert_eq!(out.names, ["p_0"]);
/// ```
#[must_use]
pub fn translate_named(sql: &str, dialect: Dialect) -> Translated<'_> {
    let style = dialect.placeholder_style();
    let ident_quote = match dialect {
        Dialect::Sqlite => Some((b'[', b']')),
        Dialect::Mysql => Some((b'`', b'`')),
        Dialect::Postgres | Dialect::Generic => None,
    };
    let dollar_quotes = matches!(dialect, Dialect::Postgres);
    let backslash_escapes = matches!(dialect, Dialect::Mysql);

    let mut out: Option<String> = None;
    let mut copied_until = 0;
    let mut names: Vec<String> = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if ident_quote.is_some_and(|(open, _)| open == b) => {
                    if let Some((_, close)) = ident_quote {
                        state = State::QuotedIdent(close);
                    }
                }
                _ if at_pair(bytes, idx, LINE_COMMENT) => state = State::LineComment,
                _ if at_pair(bytes, idx, BLOCK_OPEN) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' if dollar_quotes => {
                    if let Some((tag, advance)) = dollar_quote_opener(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b':' if at_pair(bytes, idx, CAST) => idx += 1,
                b':' => {
                    if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                        let token = placeholder_token(style, &mut names, name);
                        if let Some(token) = token {
                            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                            buf.push_str(&sql[copied_until..idx]);
                            buf.push_str(&token);
                            copied_until = end;
                        }
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted if backslash_escapes && b == b'\\' => {
                idx += 1;
            }
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::QuotedIdent(close) => {
                if b == close {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if at_pair(bytes, idx, BLOCK_OPEN) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if at_pair(bytes, idx, BLOCK_CLOSE) {
                    idx += 1;
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && closes_dollar_quote(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }

        idx += 1;
    }

    let sql = match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied_until..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    };
    Translated { sql, names }
}

/// Record `name` and return its replacement, or `None` to leave it in place.
fn placeholder_token(style: PlaceholderStyle, names: &mut Vec<String>, name: &str) -> Option<String> {
    let position = match style {
        PlaceholderStyle::Positional => {
            names.push(name.to_string());
            return Some("?".to_string());
        }
        _ => match names.iter().position(|known| known == name) {
            Some(pos) => pos + 1,
            None => {
                names.push(name.to_string());
                names.len()
            }
        },
    };
    match style {
        PlaceholderStyle::Numbered => Some(format!("?{position}")),
        PlaceholderStyle::Dollar => Some(format!("${position}")),
        PlaceholderStyle::Positional | PlaceholderStyle::Named => None,
    }
}
