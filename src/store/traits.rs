//! Store adapter contract.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use super::rows::{
    ActivePageRow, ActivityRow, AnonEditorRow, EditRow, LinkEvent, ProjectPageRow,
    ProjectRow, RevertRow, UserIdent,
};
use crate::query::{ActivityGroup, EditsQuery, RevertsQuery, TimeWindow};

/// Errors that can occur executing a composed retrieval. One opaque
/// value per failure; the caller never retries or partially recovers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// How an operation names the project it targets. When both a title and
/// an id were supplied, the id wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelector {
    Id(i64),
    Title(String),
}

/// The retrieval contract the query core composes against.
///
/// Implementations must escape every interpolated literal — the
/// composed fragments carry strings exclusively as bound parameters,
/// and an adapter must keep it that way. Implementations must be
/// thread-safe; each request runs its calls strictly sequentially.
#[async_trait]
pub trait EditStore: Send + Sync {
    /// Execute a composed edit-history retrieval.
    async fn fetch_edits(&self, query: &EditsQuery) -> StoreResult<Vec<EditRow>>;

    /// Case-insensitive lookup of user identities by name, for the
    /// retry protocol's second stage.
    async fn lookup_users_ci(&self, names: &[String]) -> StoreResult<Vec<UserIdent>>;

    /// Execute a composed revert-history retrieval.
    async fn fetch_reverts(&self, query: &RevertsQuery) -> StoreResult<Vec<RevertRow>>;

    /// List projects, optionally filtered by a case-sensitive title
    /// substring.
    async fn fetch_projects(&self, title_filter: Option<&str>) -> StoreResult<Vec<ProjectRow>>;

    /// Pages in the scope of one project.
    async fn fetch_project_pages(
        &self,
        selector: &ProjectSelector,
    ) -> StoreResult<Vec<ProjectPageRow>>;

    /// The most recent snapshot week recorded in the activity table,
    /// or `None` when no activity has been recorded.
    async fn latest_activity_week(&self) -> StoreResult<Option<i64>>;

    /// Grouped activity rows for one snapshot week, most edits first.
    async fn fetch_activity(
        &self,
        week_from: i64,
        groups: &[ActivityGroup],
    ) -> StoreResult<Vec<ActivityRow>>;

    /// The most-edited pages of one project in one snapshot week.
    async fn fetch_active_pages(
        &self,
        selector: &ProjectSelector,
        week_from: i64,
        limit: u32,
    ) -> StoreResult<Vec<ActivePageRow>>;

    /// Ids of a project's page and its subpages in the project
    /// namespace.
    async fn project_page_ids(&self, title: &str) -> StoreResult<Vec<i64>>;

    /// The membership ledger for a set of project pages, every event up
    /// to and including `end_week`, in ascending timestamp order.
    async fn fetch_link_events(
        &self,
        page_ids: &[i64],
        end_week: i64,
    ) -> StoreResult<Vec<LinkEvent>>;

    /// Anonymous editors of one page with geolocated coordinates.
    async fn fetch_anon_editors(
        &self,
        page: &str,
        namespace: i64,
        window: TimeWindow,
    ) -> StoreResult<Vec<AnonEditorRow>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: EditStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StoreResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StoreResult<Self>;
}
