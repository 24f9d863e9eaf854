//! Filter-predicate construction.
//!
//! Each builder turns one pipe-delimited request parameter into a
//! [`Fragment`]: a self-contained SQL boolean expression plus the bound
//! values it references. Fragments compose with AND across dimensions
//! and OR within a dimension's value list.
//!
//! String values are always bound parameters, never interpolated.
//! Numeric lists are parsed to integers before being inlined, so every
//! rendered character is either trusted SQL text or a digit. Anomalous
//! tokens (unknown namespace names, non-numeric ids, malformed week
//! lists) are dropped silently — the documented permissive contract.

use crate::namespace;
use rusqlite::types::Value;

/// A composable boolean filter fragment: SQL text with `?` placeholders
/// and the values bound to them, in order.
#[derive(Debug, Clone)]
pub struct Fragment {
    sql: String,
    params: Vec<Value>,
}

impl Fragment {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    /// The tautology an absent dimension composes as.
    pub fn always() -> Self {
        Self::new("1=1".into(), Vec::new())
    }

    /// A match-nothing fragment: what an empty inclusion set composes
    /// as. Deterministic stand-in for the store's `IN ()` semantics.
    pub fn never() -> Self {
        Self::new("0=1".into(), Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Consume the fragment, yielding its bound values.
    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

/// Split a pipe-delimited parameter into raw tokens.
fn tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('|')
}

/// Parse a token as a non-negative-capable integer id. Whitespace-padded
/// tokens are accepted the way loose numeric coercion would.
fn parse_int(token: &str) -> Option<i64> {
    token.trim().parse::<i64>().ok()
}

/// Render an inlined integer IN-list. Only call with parsed integers.
fn int_in_list(field: &str, ids: &[i64]) -> String {
    let list = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{field} IN ({list})")
}

/// Namespace filter: each token is either a numeric id (used as-is when
/// non-negative) or a namespace name resolved through the vocabulary.
/// Unresolvable and negative tokens are dropped; an empty result set
/// falls back to the Article namespace rather than matching nothing.
pub fn namespace_fragment(raw: &str, field: Option<&str>) -> Fragment {
    let field = field.unwrap_or("ew.namespace");
    let ids: Vec<i64> = tokens(raw)
        .filter_map(|t| parse_int(t).or_else(|| namespace::id(t)))
        .filter(|id| *id >= 0)
        .collect();

    if ids.is_empty() {
        Fragment::new(int_in_list(field, &[0]), Vec::new())
    } else {
        Fragment::new(int_in_list(field, &ids), Vec::new())
    }
}

/// Exact user-name inclusion list. Values are bound as literals; the
/// store adapter never sees them as SQL text.
pub fn user_fragment(raw: &str, field: Option<&str>) -> Fragment {
    let field = field.unwrap_or("u.name");
    let names: Vec<&str> = tokens(raw).collect();
    let placeholders = vec!["?"; names.len()].join(",");
    Fragment::new(
        format!("{field} IN ({placeholders})"),
        names.into_iter().map(|n| Value::from(n.to_string())).collect(),
    )
}

/// Page-title filter: each token matches exactly, or — with `subpages` —
/// also any title under `token/`.
pub fn page_fragment(raw: &str, field: Option<&str>, subpages: bool) -> Fragment {
    let field = field.unwrap_or("p.title");
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for title in tokens(raw) {
        if subpages {
            clauses.push(format!("{field} LIKE ? OR {field} = ?"));
            params.push(Value::from(format!("{title}/%")));
            params.push(Value::from(title.to_string()));
        } else {
            clauses.push(format!("{field} = ?"));
            params.push(Value::from(title.to_string()));
        }
    }
    Fragment::new(format!("({})", clauses.join(" OR ")), params)
}

/// Numeric id inclusion list (page ids, user ids). Non-numeric tokens
/// are dropped; an all-non-numeric input composes as match-nothing.
pub fn id_list_fragment(raw: &str, field: &str) -> Fragment {
    let ids: Vec<i64> = tokens(raw).filter_map(parse_int).collect();
    if ids.is_empty() {
        Fragment::never()
    } else {
        Fragment::new(int_in_list(field, &ids), Vec::new())
    }
}

/// Inclusion list over already-typed ids. Used by the retry protocol
/// when substituting corrected user identities for a name predicate.
pub fn id_set_fragment(ids: &[i64], field: &str) -> Fragment {
    if ids.is_empty() {
        Fragment::never()
    } else {
        Fragment::new(int_in_list(field, ids), Vec::new())
    }
}

/// Compound page+week filter. Input alternates page titles with
/// comma-delimited week lists: `page1|210,211|page2|300,301`. Builds an
/// OR of per-page `(title match AND week in set)` clauses. Non-integer
/// week tokens are dropped; a page whose week list parses empty is
/// dropped with it.
pub fn page_week_fragment(
    raw: &str,
    page_field: Option<&str>,
    week_field: Option<&str>,
) -> Fragment {
    let page_field = page_field.unwrap_or("p.title");
    let week_field = week_field.unwrap_or("ew.week");

    let mut clauses = Vec::new();
    let mut params = Vec::new();
    let items: Vec<&str> = tokens(raw).collect();
    for pair in items.chunks(2) {
        let [title, weeks] = pair else { continue };
        let week_ids: Vec<i64> = weeks.split(',').filter_map(parse_int).collect();
        if week_ids.is_empty() {
            continue;
        }
        clauses.push(format!(
            "({page_field} = ? AND {})",
            int_in_list(week_field, &week_ids)
        ));
        params.push(Value::from(title.to_string()));
    }

    if clauses.is_empty() {
        Fragment::never()
    } else {
        Fragment::new(format!("({})", clauses.join(" OR ")), params)
    }
}
