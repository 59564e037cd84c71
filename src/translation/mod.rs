//! Splitting a SQL batch into its individual statements.
//!
//! Native adapters whose driver compiles one statement at a time use this to run a batch such as
//! `INSERT ...;SELECT last_insert_rowid() AS LastInsertId;` as consecutive result sets.

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_escaped_quote, is_line_comment_start,
};
use scanner::State;

/// Split `sql` on top-level semicolons.
///
/// Semicolons inside string literals, quoted identifiers (`"x"`, `` `x` ``, `[x]`) and comments do
/// not split. Pieces holding only whitespace and comments are dropped; the others are returned
/// trimmed, without the terminating semicolon.
///
/// Warning: this is a lexical split. Statements that legitimately contain top-level semicolons,
/// such as `CREATE TRIGGER ... BEGIN ...; END`, are cut apart.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut pieces = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut has_code = false;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                if b == b';' {
                    if has_code {
                        pieces.push(sql[start..idx].trim());
                    }
                    start = idx + 1;
                    has_code = false;
                } else if is_line_comment_start(bytes, idx) {
                    state = State::LineComment;
                    idx += 1;
                } else if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment;
                    idx += 1;
                } else if let Some(quoted) = State::opened_by(b) {
                    state = quoted;
                    has_code = true;
                } else if !b.is_ascii_whitespace() {
                    has_code = true;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if is_block_comment_end(bytes, idx) {
                    state = State::Normal;
                    idx += 1;
                }
            }
            quoted => {
                if Some(b) == quoted.closing_byte() {
                    if is_escaped_quote(bytes, idx, b) {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
        }
        idx += 1;
    }

    if has_code {
        pieces.push(sql[start..].trim());
    }
    pieces
}
