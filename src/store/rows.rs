//! Typed row schemas, one per query shape.
//!
//! Every retrieval has an explicit field-level contract; type coercion
//! happens at the adapter boundary, not downstream.

use serde::Serialize;

/// One aggregated edit-history row.
#[derive(Debug, Clone, Serialize)]
pub struct EditRow {
    pub user_id: i64,
    pub user_name: String,
    pub page_id: i64,
    pub page_namespace: i64,
    pub edits: i64,
    pub week: i64,
    pub page_title: String,
    /// User-group membership (e.g. `bot`), when any.
    pub user_group: Option<String>,
    /// Article assessment, when requested and recorded.
    pub assessment: Option<String>,
}

/// One per-user-per-week revert count.
#[derive(Debug, Clone, Serialize)]
pub struct RevertRow {
    pub user: String,
    pub week: i64,
    pub page_title: String,
    pub page_namespace: i64,
    pub count: i64,
}

/// A project directory entry.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRow {
    pub id: i64,
    pub title: String,
    pub created: String,
}

/// A page within a project's scope.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectPageRow {
    pub page_id: i64,
    pub project_id: i64,
    pub parent_category: Option<String>,
    pub title: String,
    pub namespace: i64,
}

/// One grouped project-activity row for the latest snapshot period.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRow {
    pub project_id: i64,
    pub project_title: String,
    pub project_created: String,
    pub namespace: i64,
    /// Present only when grouping by title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    pub edits: i64,
    pub pages: i64,
}

/// A most-active page within one project's latest snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ActivePageRow {
    pub page_id: i64,
    pub title: String,
    pub namespace: i64,
    pub edits: i64,
}

/// A user identity returned by the case-insensitive lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdent {
    pub id: i64,
    pub name: String,
}

/// One entry of the membership ledger: a user's link to a project page
/// was added or removed at a point in time. The store returns these in
/// strictly ascending `link_date` order; consumers never re-sort.
#[derive(Debug, Clone)]
pub struct LinkEvent {
    pub project_id: i64,
    pub page_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub week: i64,
    pub removed: bool,
    pub link_date: String,
    pub page_title: String,
    pub page_namespace: i64,
}

/// An anonymous editor with geolocated coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct AnonEditorRow {
    pub user_name: String,
    pub edits: i64,
    pub week: i64,
    pub lat: f64,
    pub long: f64,
}
