/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! SQL analysis helpers
//!
//! Catalogue queries are written with positional `?` placeholders; the wire
//! protocol wants `$1..$n`. The scanner here skips string literals, quoted
//! identifiers, dollar-quoted bodies and comments so a `?` inside a literal
//! is never miscounted or rewritten.
//!
//! The table and column extractors are best-effort regex scans. Identifiers
//! inside comments, string literals or dynamically assembled SQL can be
//! misread; callers report the extractor output verbatim rather than
//! guessing.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
  Normal,
  SingleQuote,
  DoubleQuote,
  LineComment,
  BlockComment,
  DollarQuote,
}

/// Walk `sql` and call `on_placeholder` for each `?` found outside quoted
/// or commented regions; all other characters are forwarded to `emit`.
fn scan_sql(sql: &str, mut emit: impl FnMut(char), mut on_placeholder: impl FnMut()) {
  let chars: Vec<char> = sql.chars().collect();
  let mut state = ScanState::Normal;
  let mut dollar_tag = String::new();
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    let next = chars.get(i + 1).copied();

    match state {
      ScanState::Normal => match c {
        '?' => {
          on_placeholder();
          i += 1;
          continue;
        }
        '\'' => {
          state = ScanState::SingleQuote;
        }
        '"' => {
          state = ScanState::DoubleQuote;
        }
        '-' if next == Some('-') => {
          state = ScanState::LineComment;
        }
        '/' if next == Some('*') => {
          state = ScanState::BlockComment;
        }
        '$' => {
          // `$tag$` opens a dollar-quoted body; a bare `$` stays normal
          if let Some(tag) = dollar_tag_at(&chars, i) {
            for tc in tag.chars() {
              emit(tc);
            }
            i += tag.len();
            dollar_tag = tag;
            state = ScanState::DollarQuote;
            continue;
          }
        }
        _ => {}
      },
      ScanState::SingleQuote => {
        if c == '\'' {
          // doubled quote is an escaped quote, stay inside the literal
          if next == Some('\'') {
            emit(c);
            emit('\'');
            i += 2;
            continue;
          }
          state = ScanState::Normal;
        }
      }
      ScanState::DoubleQuote => {
        if c == '"' {
          state = ScanState::Normal;
        }
      }
      ScanState::LineComment => {
        if c == '\n' {
          state = ScanState::Normal;
        }
      }
      ScanState::BlockComment => {
        if c == '*' && next == Some('/') {
          emit('*');
          emit('/');
          i += 2;
          state = ScanState::Normal;
          continue;
        }
      }
      ScanState::DollarQuote => {
        if c == '$' {
          if let Some(tag) = dollar_tag_at(&chars, i) {
            if tag == dollar_tag {
              for tc in tag.chars() {
                emit(tc);
              }
              i += tag.len();
              state = ScanState::Normal;
              continue;
            }
          }
        }
      }
    }

    emit(c);
    i += 1;
  }
}

/// Return the `$tag$` token starting at `i`, if any.
fn dollar_tag_at(chars: &[char], i: usize) -> Option<String> {
  if chars.get(i) != Some(&'$') {
    return None;
  }
  let mut j = i + 1;
  while j < chars.len() {
    let c = chars[j];
    if c == '$' {
      return Some(chars[i..=j].iter().collect());
    }
    if !c.is_ascii_alphanumeric() && c != '_' {
      return None;
    }
    j += 1;
  }
  None
}

/// Number of bind placeholders in the statement.
pub fn count_placeholders(sql: &str) -> usize {
  let mut count = 0;
  scan_sql(sql, |_| {}, || count += 1);
  count
}

/// Rewrite `?` placeholders to `$1..$n`. Returns the rewritten SQL and the
/// placeholder count.
pub fn rewrite_placeholders(sql: &str) -> (String, usize) {
  let out = std::cell::RefCell::new(String::with_capacity(sql.len() + 8));
  let mut count = 0;
  scan_sql(
    sql,
    |c| out.borrow_mut().push(c),
    || {
      count += 1;
      let mut out = out.borrow_mut();
      out.push('$');
      out.push_str(&count.to_string());
    },
  );
  (out.into_inner(), count)
}

fn table_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r#"(?i)\b(?:from|join)\s+("?[A-Za-z_][A-Za-z0-9_]*"?(?:\."?[A-Za-z_][A-Za-z0-9_]*"?)?)"#)
      .expect("table regex")
  })
}

/// Identifiers following `FROM` and `JOIN`; a trailing `schema.table` is
/// collapsed to `table`. Order of first appearance, no duplicates.
pub fn extract_tables(sql: &str) -> Vec<String> {
  let mut tables = Vec::new();
  for cap in table_regex().captures_iter(sql) {
    let raw = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
    let name = raw.rsplit('.').next().unwrap_or(raw).trim_matches('"').to_string();
    if !name.is_empty() && !tables.contains(&name) {
      tables.push(name);
    }
  }
  tables
}

const SQL_KEYWORDS: [&str; 24] = [
  "select", "distinct", "from", "where", "and", "or", "not", "null", "is", "in", "like", "ilike",
  "between", "as", "on", "join", "inner", "left", "right", "outer", "group", "order", "by", "case",
];

fn select_list_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?is)\bselect\s+(.*?)\s+from\b").expect("select list regex"))
}

fn where_clause_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?is)\bwhere\s+(.*?)(?:\bgroup\s+by\b|\border\s+by\b|\blimit\b|\boffset\b|$)")
      .expect("where clause regex")
  })
}

fn predicate_column_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"(?i)([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\s*(?:=|!=|<>|<=|>=|<|>|\bLIKE\b|\bILIKE\b|\bIN\b|\bBETWEEN\b|\bIS\b)",
    )
    .expect("predicate column regex")
  })
}

/// Column names referenced by the SELECT list and the WHERE predicates.
/// `SELECT *` contributes nothing. Qualified names are collapsed to their
/// final segment.
pub fn extract_columns(sql: &str) -> Vec<String> {
  let mut columns = Vec::new();

  if let Some(cap) = select_list_regex().captures(sql) {
    let list = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
    for item in list.split(',') {
      let item = item.trim();
      if item == "*" || item.is_empty() || item.contains('(') {
        continue;
      }
      // drop a trailing alias, keep the selected expression
      let expr = item.split_whitespace().next().unwrap_or(item);
      push_column(&mut columns, expr);
    }
  }

  if let Some(cap) = where_clause_regex().captures(sql) {
    let clause = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
    for pcap in predicate_column_regex().captures_iter(clause) {
      let expr = pcap.get(1).map(|m| m.as_str()).unwrap_or_default();
      push_column(&mut columns, expr);
    }
  }

  columns
}

fn push_column(columns: &mut Vec<String>, expr: &str) {
  let name = expr.rsplit('.').next().unwrap_or(expr).trim_matches('"').to_lowercase();
  if name.is_empty() || SQL_KEYWORDS.contains(&name.as_str()) {
    return;
  }
  if !name.chars().next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false) {
    return;
  }
  if !columns.contains(&name) {
    columns.push(name);
  }
}
