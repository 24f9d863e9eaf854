//! Transport-independent API layer.
//!
//! `ReflexApi` is the single entry point for all consumer-facing
//! operations. Transports (HTTP, CLI, direct embedding) call these
//! methods and serialize the returned payloads into the response
//! envelope — they never reach into the builders or the store directly.

pub mod params;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::activity::{self, ProjectActivity};
use crate::member::{self, MemberMap};
use crate::namespace;
use crate::query::{
    id_list_fragment, id_set_fragment, namespace_fragment, page_fragment,
    page_week_fragment, user_fragment, ActivityGroup, EditsQuery, Fragment, GroupSpec,
    Order, RevertsQuery, SortDirection, TimeWindow,
};
use crate::store::{
    ActivePageRow, ActivityRow, AnonEditorRow, EditRow, EditStore, ProjectPageRow,
    ProjectRow, ProjectSelector, RevertRow, StoreError,
};
use params::{
    ActivePagesRequest, ActiveProjectsRequest, AnonCoordsRequest, EditsRequest,
    MembersRequest, ProjectPagesRequest, ProjectsRequest, RevertsRequest,
};

/// Errors surfaced to the caller as a failure envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A mandatory dimension was entirely absent. Never retried.
    #[error("{0}")]
    MissingArgument(String),

    /// The retry protocol found no user under any casing.
    #[error("No users found with case-insensitive search for {0}")]
    NoMatchingUser(String),

    /// The backing store failed executing a composed query. Propagated
    /// as-is, never retried.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

// --- Parameter interpretation (the documented permissive contract) ---

/// A parameter counts as supplied only when non-empty.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Boolean-ish flags: anything but absent/empty/`0`/`false` is on.
fn flag(value: &Option<String>) -> bool {
    matches!(present(value), Some(s) if s != "0" && s != "false")
}

/// Week arguments: non-numeric is absent, and so is an explicit 0 (the
/// transport's conventional "not given" marker).
fn week_param(value: &Option<String>) -> Option<i64> {
    present(value)?.trim().parse::<i64>().ok().filter(|w| *w != 0)
}

fn int_param(value: &Option<String>) -> Option<i64> {
    present(value)?.trim().parse().ok()
}

/// Row-cap arguments: absent or non-numeric falls back to the default;
/// non-positive means unlimited.
fn limit_param(value: &Option<String>, default: u32) -> Option<u32> {
    match int_param(value) {
        None => Some(default),
        Some(n) if n <= 0 => None,
        Some(n) => Some(n as u32),
    }
}

// --- Output shapes ---

/// One edit-history output record. Which optional fields appear is
/// driven by the grouping spec, independent of how grouping was applied
/// at retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct EditRecord {
    pub user_id: i64,
    pub user_name: String,
    pub edits: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_namespace: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
}

fn shape_edits(rows: Vec<EditRow>, group: &GroupSpec) -> Vec<EditRecord> {
    let with_page = group.includes_page();
    let with_date = group.includes_date();
    let with_assessment = with_page || group.includes_assessment();
    rows.into_iter()
        .map(|row| EditRecord {
            user_id: row.user_id,
            user_name: row.user_name,
            edits: row.edits,
            page_id: with_page.then_some(row.page_id),
            page_namespace: with_page.then_some(row.page_namespace),
            page_title: with_page.then_some(row.page_title),
            week: with_date.then_some(row.week),
            user_group: row.user_group,
            assessment: if with_assessment { row.assessment } else { None },
        })
        .collect()
}

/// Active-projects payload: grouped rows, or the dense per-project
/// matrix when compression was requested.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActiveProjectsResult {
    Rows(Vec<ActivityRow>),
    Matrix(Vec<ProjectActivity>),
}

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct ReflexApi {
    store: Arc<dyn EditStore>,
}

impl ReflexApi {
    /// Create a new API instance over a store adapter.
    pub fn new(store: Arc<dyn EditStore>) -> Self {
        Self { store }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Most frequently edited pages for a set of users, or most active
    /// users for a set of pages. Owns the three-stage case-insensitive
    /// user retry protocol.
    pub async fn edits(&self, req: &EditsRequest) -> ApiResult<Vec<EditRecord>> {
        let user = present(&req.user);
        let any_filter = user.is_some()
            || present(&req.user_id).is_some()
            || present(&req.page).is_some()
            || present(&req.page_id).is_some()
            || present(&req.page_week).is_some()
            || present(&req.project_id).is_some();
        if !any_filter {
            return Err(ApiError::MissingArgument(
                "'user', 'userid', 'page', 'pageid', 'projectid', or 'pageweek' \
                 argument is required."
                    .to_string(),
            ));
        }

        let window = TimeWindow::resolve(
            present(&req.sd),
            present(&req.ed),
            week_param(&req.sw),
            week_param(&req.ew),
            Self::today(),
        )
        .repair();
        let group = req.group.as_deref().map(GroupSpec::parse).unwrap_or_default();

        let query = EditsQuery {
            namespace: namespace_fragment(req.namespace.as_deref().unwrap_or("0"), None),
            user: user.map(|v| user_fragment(v, None)).unwrap_or_else(Fragment::always),
            user_id: present(&req.user_id)
                .map(|v| id_list_fragment(v, "ew.user_id"))
                .unwrap_or_else(Fragment::always),
            page: present(&req.page)
                .map(|v| page_fragment(v, None, flag(&req.subpages)))
                .unwrap_or_else(Fragment::always),
            page_id: present(&req.page_id)
                .map(|v| id_list_fragment(v, "ew.page_id"))
                .unwrap_or_else(Fragment::always),
            page_week: present(&req.page_week)
                .map(|v| page_week_fragment(v, None, None))
                .unwrap_or_else(Fragment::always),
            window,
            group: group.clone(),
            order: Order::parse(req.order.as_deref().unwrap_or_default()),
            direction: SortDirection::parse(req.direction.as_deref().unwrap_or_default()),
            limit: limit_param(&req.limit, 1000),
            with_assessment: flag(&req.assessment),
            exclude_bots: flag(&req.exclude_bots),
            project_id: present(&req.project_id).map(str::to_string),
        };

        // Stage 1: exact-name retrieval.
        let rows = self.store.fetch_edits(&query).await?;
        let Some(user_raw) = user else {
            return Ok(shape_edits(rows, &group));
        };
        if !rows.is_empty() {
            return Ok(shape_edits(rows, &group));
        }

        // Stage 2: case-insensitive identity lookup. Only candidates
        // that are genuinely case-folding corrections count — a name
        // that already matched exactly was covered by stage 1.
        let requested: Vec<String> = user_raw.split('|').map(str::to_string).collect();
        debug!(user = user_raw, "exact retrieval empty, case-insensitive lookup");
        let candidates = self.store.lookup_users_ci(&requested).await?;
        if candidates.is_empty() {
            return Err(ApiError::NoMatchingUser(requested.join(",")));
        }
        let requested_lower: Vec<String> =
            requested.iter().map(|n| n.to_lowercase()).collect();
        let corrected: Vec<i64> = candidates
            .iter()
            .filter(|c| {
                !requested.contains(&c.name)
                    && requested_lower.contains(&c.name.to_lowercase())
            })
            .map(|c| c.id)
            .collect();
        if corrected.is_empty() {
            return Ok(Vec::new());
        }

        // Stage 3: re-issue with an id predicate built from the
        // corrected identities, dropping the name predicate entirely.
        let mut retry = query.clone();
        retry.user = Fragment::always();
        retry.user_id = id_set_fragment(&corrected, "ew.user_id");
        debug!(ids = ?corrected, "retrying with case-corrected user ids");
        let rows = self.store.fetch_edits(&retry).await?;
        Ok(shape_edits(rows, &group))
    }

    /// Reverted-edit counts per user per week.
    pub async fn reverts(&self, req: &RevertsRequest) -> ApiResult<Vec<RevertRow>> {
        let Some(user) = present(&req.user) else {
            return Err(ApiError::MissingArgument(
                "'user' argument is required".to_string(),
            ));
        };
        let window = TimeWindow::resolve(
            present(&req.sd),
            present(&req.ed),
            week_param(&req.sw),
            week_param(&req.ew),
            Self::today(),
        )
        .repair();

        let query = RevertsQuery {
            user: user_fragment(user, None),
            namespace: namespace_fragment(
                req.namespace.as_deref().unwrap_or("0"),
                Some("p.namespace"),
            ),
            window,
            limit: limit_param(&req.limit, 20),
        };
        Ok(self.store.fetch_reverts(&query).await?)
    }

    /// Project directory, optionally filtered by title substring.
    pub async fn projects(&self, req: &ProjectsRequest) -> ApiResult<Vec<ProjectRow>> {
        Ok(self.store.fetch_projects(present(&req.title)).await?)
    }

    /// Pages in a project's scope, keyed by the identifier the caller
    /// supplied.
    pub async fn project_pages(
        &self,
        req: &ProjectPagesRequest,
    ) -> ApiResult<BTreeMap<String, Vec<ProjectPageRow>>> {
        let (selector, key) = if let Some(id) = int_param(&req.page_id) {
            (ProjectSelector::Id(id), id.to_string())
        } else if let Some(title) = present(&req.project) {
            (ProjectSelector::Title(title.to_string()), title.to_string())
        } else {
            return Err(ApiError::MissingArgument(
                "Must include either project or pageid argument".to_string(),
            ));
        };

        let rows = self.store.fetch_project_pages(&selector).await?;
        let mut result = BTreeMap::new();
        if !rows.is_empty() {
            result.insert(key, rows);
        }
        Ok(result)
    }

    /// Projects ordered by edits in the latest activity snapshot.
    pub async fn active_projects(
        &self,
        req: &ActiveProjectsRequest,
    ) -> ApiResult<ActiveProjectsResult> {
        let groups = ActivityGroup::parse_list(req.group.as_deref().unwrap_or("project"));
        let compress = matches!(present(&req.compress), Some("project"));

        let Some(week) = self.store.latest_activity_week().await? else {
            // Nothing recorded yet: success, zero rows.
            return Ok(match compress {
                true => ActiveProjectsResult::Matrix(Vec::new()),
                false => ActiveProjectsResult::Rows(Vec::new()),
            });
        };

        let rows = self.store.fetch_activity(week, &groups).await?;
        Ok(if compress {
            ActiveProjectsResult::Matrix(activity::compress(&rows))
        } else {
            ActiveProjectsResult::Rows(rows)
        })
    }

    /// Most recently active pages within one project.
    pub async fn active_project_pages(
        &self,
        req: &ActivePagesRequest,
    ) -> ApiResult<Vec<ActivePageRow>> {
        let selector = if let Some(id) = int_param(&req.project_id) {
            ProjectSelector::Id(id)
        } else if let Some(title) = present(&req.project) {
            ProjectSelector::Title(title.to_string())
        } else {
            return Err(ApiError::MissingArgument(
                "Either project or project_id is required".to_string(),
            ));
        };
        let limit = int_param(&req.limit)
            .filter(|n| *n > 0)
            .map(|n| n as u32)
            .unwrap_or(10);

        let Some(week) = self.store.latest_activity_week().await? else {
            return Ok(Vec::new());
        };
        Ok(self.store.fetch_active_pages(&selector, week, limit).await?)
    }

    /// Project members within a timeframe, reconstructed from the link
    /// ledger.
    pub async fn project_members(&self, req: &MembersRequest) -> ApiResult<MemberMap> {
        let window = TimeWindow::resolve(
            present(&req.sd),
            present(&req.ed),
            None,
            None,
            Self::today(),
        );

        let page_ids: Vec<i64> = if let Some(title) = present(&req.project) {
            self.store.project_page_ids(title).await?
        } else if let Some(raw) = present(&req.page_id) {
            raw.split('|').filter_map(|t| t.trim().parse().ok()).collect()
        } else {
            return Err(ApiError::MissingArgument(
                "Must include either project or pageid argument".to_string(),
            ));
        };

        let events = self.store.fetch_link_events(&page_ids, window.end_week).await?;
        Ok(member::reconstruct(&events, window))
    }

    /// Anonymous editors of a page with geolocated coordinates.
    pub async fn anon_coords(
        &self,
        req: &AnonCoordsRequest,
    ) -> ApiResult<Vec<AnonEditorRow>> {
        let (Some(page), Some(ns_raw)) = (present(&req.page), present(&req.namespace))
        else {
            return Err(ApiError::MissingArgument(
                "'page' and 'namespace' arguments are required.".to_string(),
            ));
        };
        let Some(ns) = ns_raw.parse::<i64>().ok().or_else(|| namespace::id(ns_raw))
        else {
            return Err(ApiError::MissingArgument(
                "'page' and 'namespace' arguments are required.".to_string(),
            ));
        };

        let window = TimeWindow::resolve(
            present(&req.sd),
            present(&req.ed),
            None,
            None,
            Self::today(),
        );
        Ok(self.store.fetch_anon_editors(page, ns, window).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit_row(user: &str, edits: i64) -> EditRow {
        EditRow {
            user_id: 1,
            user_name: user.to_string(),
            page_id: 10,
            page_namespace: 0,
            edits,
            week: 150,
            page_title: "Cats".to_string(),
            user_group: None,
            assessment: Some("GA".to_string()),
        }
    }

    #[test]
    fn shape_defaults_to_user_fields_only() {
        let records = shape_edits(vec![edit_row("Alice", 5)], &GroupSpec::default());
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["user_name"], "Alice");
        assert_eq!(json["edits"], 5);
        assert!(json.get("page_id").is_none());
        assert!(json.get("week").is_none());
        assert!(json.get("assessment").is_none());
    }

    #[test]
    fn shape_page_grouping_exposes_page_and_assessment() {
        let group = GroupSpec::parse("page|user");
        let records = shape_edits(vec![edit_row("Alice", 5)], &group);
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["page_title"], "Cats");
        assert_eq!(json["page_namespace"], 0);
        assert_eq!(json["assessment"], "GA");
        assert!(json.get("week").is_none());
    }

    #[test]
    fn shape_date_grouping_exposes_week() {
        let group = GroupSpec::parse("user|date");
        let records = shape_edits(vec![edit_row("Alice", 5)], &group);
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["week"], 150);
        assert!(json.get("page_title").is_none());
    }

    #[test]
    fn flags_follow_the_loose_contract() {
        assert!(flag(&Some("1".to_string())));
        assert!(flag(&Some("yes".to_string())));
        assert!(!flag(&Some("0".to_string())));
        assert!(!flag(&Some("false".to_string())));
        assert!(!flag(&Some(String::new())));
        assert!(!flag(&None));
    }

    #[test]
    fn week_zero_counts_as_absent() {
        assert_eq!(week_param(&Some("0".to_string())), None);
        assert_eq!(week_param(&Some("350".to_string())), Some(350));
        assert_eq!(week_param(&Some("junk".to_string())), None);
    }

    #[test]
    fn limits_default_and_go_unlimited() {
        assert_eq!(limit_param(&None, 1000), Some(1000));
        assert_eq!(limit_param(&Some("50".to_string()), 1000), Some(50));
        assert_eq!(limit_param(&Some("0".to_string()), 1000), None);
        assert_eq!(limit_param(&Some("-5".to_string()), 1000), None);
        assert_eq!(limit_param(&Some("lots".to_string()), 1000), Some(1000));
    }
}
