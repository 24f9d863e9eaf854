//! Composed retrieval requests.
//!
//! A query spec is the single data-retrieval request handed to the
//! store adapter: per-dimension filter fragments AND-composed with the
//! time window, plus grouping, ordering, and limit. The store renders
//! the surrounding SELECT; the spec owns the boolean composition and
//! the bound-parameter ordering.

use rusqlite::types::Value;

use super::group::GroupSpec;
use super::predicate::Fragment;
use super::window::TimeWindow;

/// Result ordering for edit queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Most-edited first (aggregate edit count).
    #[default]
    Count,
    /// Chronological by week.
    Date,
}

impl Order {
    /// Parse loosely: unrecognized tokens fall back to `Count`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "date" => Self::Date,
            _ => Self::Count,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Count => "edits",
            Self::Date => "ew.week",
        }
    }
}

/// Sort direction; unrecognized tokens fall back to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The composed edit-history retrieval request.
///
/// Every dimension is a [`Fragment`]; absent dimensions compose as the
/// tautology. The retry protocol rewrites `user`/`user_id` between
/// stages, so both stay independently replaceable.
#[derive(Debug, Clone)]
pub struct EditsQuery {
    pub namespace: Fragment,
    pub user: Fragment,
    pub user_id: Fragment,
    pub page: Fragment,
    pub page_id: Fragment,
    pub page_week: Fragment,
    pub window: TimeWindow,
    pub group: GroupSpec,
    pub order: Order,
    pub direction: SortDirection,
    /// `None` means no limit.
    pub limit: Option<u32>,
    pub with_assessment: bool,
    pub exclude_bots: bool,
    /// Scope to pages of one project. Bound as a literal; the store's
    /// column affinity handles numeric text the way the original did.
    pub project_id: Option<String>,
}

impl EditsQuery {
    /// The AND-composed WHERE clause. Placeholder order matches
    /// [`EditsQuery::params`] exactly.
    pub fn where_sql(&self) -> String {
        let mut parts = vec![
            self.namespace.sql().to_string(),
            self.user.sql().to_string(),
            self.user_id.sql().to_string(),
            self.page.sql().to_string(),
            self.page_id.sql().to_string(),
            self.page_week.sql().to_string(),
            "ew.week >= ?".to_string(),
            "ew.week <= ?".to_string(),
        ];
        if self.exclude_bots {
            parts.push("(ug.grp != 'bot' OR ug.grp IS NULL)".to_string());
        }
        if self.project_id.is_some() {
            parts.push("pp.project_id = ?".to_string());
        }
        parts.join(" AND ")
    }

    /// Bound values, in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        let mut params = Vec::new();
        for fragment in [
            &self.namespace,
            &self.user,
            &self.user_id,
            &self.page,
            &self.page_id,
            &self.page_week,
        ] {
            params.extend_from_slice(fragment.params());
        }
        params.push(Value::from(self.window.start_week));
        params.push(Value::from(self.window.end_week));
        if let Some(project_id) = &self.project_id {
            params.push(Value::from(project_id.clone()));
        }
        params
    }

    pub fn order_sql(&self) -> String {
        format!("{} {}", self.order.column(), self.direction.keyword())
    }

    pub fn limit_sql(&self) -> String {
        match self.limit {
            Some(n) => format!(" LIMIT {n}"),
            None => String::new(),
        }
    }

    /// Whether the assessment table participates at all — either the
    /// caller asked for assessment fields or the grouping needs the
    /// column.
    pub fn needs_assessment(&self) -> bool {
        self.with_assessment || self.group.includes_assessment()
    }
}

/// The composed revert-history retrieval request.
#[derive(Debug, Clone)]
pub struct RevertsQuery {
    pub user: Fragment,
    pub namespace: Fragment,
    pub window: TimeWindow,
    pub limit: Option<u32>,
}

impl RevertsQuery {
    pub fn where_sql(&self) -> String {
        format!("{} AND {}", self.namespace.sql(), self.user.sql())
    }

    pub fn params(&self) -> Vec<Value> {
        let mut params = Vec::new();
        params.extend_from_slice(self.namespace.params());
        params.extend_from_slice(self.user.params());
        params
    }

    pub fn limit_sql(&self) -> String {
        match self.limit {
            Some(n) => format!(" LIMIT {n}"),
            None => String::new(),
        }
    }
}
