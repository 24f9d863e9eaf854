//! Transport-facing request structs.
//!
//! Every field arrives verbatim from the transport as an optional raw
//! string (multi-valued fields use `|`-delimited encoding); all
//! interpretation — numeric parsing, flags, defaults — happens in the
//! API layer, under the documented permissive contract.

use serde::Deserialize;

/// Parameters for the edit-history endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EditsRequest {
    /// Users to query, `|`-delimited exact names.
    pub user: Option<String>,
    /// User ids, `|`-delimited.
    #[serde(rename = "userid")]
    pub user_id: Option<String>,
    /// Page titles, `|`-delimited.
    pub page: Option<String>,
    /// When set, page matches include subpages (`title/...`).
    pub subpages: Option<String>,
    /// Page ids, `|`-delimited.
    #[serde(rename = "pageid")]
    pub page_id: Option<String>,
    /// Alternating page/week-list compound filter:
    /// `page1|210,211|page2|300,301`.
    #[serde(rename = "pageweek")]
    pub page_week: Option<String>,
    /// Include assessment information for the pages edited.
    pub assessment: Option<String>,
    /// Exclude edits by users in the bot group.
    #[serde(rename = "excludeBots")]
    pub exclude_bots: Option<String>,
    /// Limit edits to pages within the scope of one project.
    #[serde(rename = "projectid")]
    pub project_id: Option<String>,
    /// Start date, `YYYYMMDD`.
    pub sd: Option<String>,
    /// End date, `YYYYMMDD`.
    pub ed: Option<String>,
    /// Start week (wins over `sd`).
    pub sw: Option<String>,
    /// End week (wins over `ed`).
    pub ew: Option<String>,
    /// Namespace names or ids, `|`-delimited. Default `0` (Article).
    pub namespace: Option<String>,
    /// Row cap; default 1000, non-positive means unlimited.
    pub limit: Option<String>,
    /// `count` (default) or `date`.
    pub order: Option<String>,
    /// `asc` or `desc` (default).
    pub direction: Option<String>,
    /// Grouping dimensions, `|`-delimited. Default `user`.
    pub group: Option<String>,
}

/// Parameters for the revert-history endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RevertsRequest {
    pub user: Option<String>,
    pub sd: Option<String>,
    pub ed: Option<String>,
    pub sw: Option<String>,
    pub ew: Option<String>,
    pub namespace: Option<String>,
    /// Default 20.
    pub limit: Option<String>,
}

/// Parameters for the project directory endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProjectsRequest {
    /// Case-sensitive substring the project title must contain.
    pub title: Option<String>,
}

/// Parameters for the project-pages endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProjectPagesRequest {
    /// Project title (its page in the project namespace).
    pub project: Option<String>,
    /// Project page id; wins over `project` when both are given.
    #[serde(rename = "pageid")]
    pub page_id: Option<String>,
}

/// Parameters for the active-projects endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ActiveProjectsRequest {
    /// Grouping tokens from `{project, namespace, title}`, `|`-delimited.
    pub group: Option<String>,
    /// `project` folds rows into one dense matrix record per project.
    pub compress: Option<String>,
}

/// Parameters for the active-project-pages endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ActivePagesRequest {
    pub project: Option<String>,
    /// Wins over `project` when both are given.
    pub project_id: Option<String>,
    /// Default 10.
    pub limit: Option<String>,
}

/// Parameters for the project-members endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MembersRequest {
    /// Project title; its page and subpages define the membership scope.
    pub project: Option<String>,
    /// Explicit project page ids, `|`-delimited. Scope is exactly these
    /// pages, no subpage expansion.
    #[serde(rename = "pageid")]
    pub page_id: Option<String>,
    pub sd: Option<String>,
    pub ed: Option<String>,
}

/// Parameters for the anonymous-editor-coordinates endpoint.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnonCoordsRequest {
    pub page: Option<String>,
    /// Namespace id or name.
    pub namespace: Option<String>,
    pub sd: Option<String>,
    pub ed: Option<String>,
}
