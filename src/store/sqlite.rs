//! SQLite store adapter.
//!
//! Renders composed query specs into SQL and executes them over a
//! single connection. Thread-safe via an internal mutex. Every string
//! literal arrives as a bound parameter; the only inlined values are
//! integers parsed by the predicate builders.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use super::rows::{
    ActivePageRow, ActivityRow, AnonEditorRow, EditRow, LinkEvent, ProjectPageRow,
    ProjectRow, RevertRow, UserIdent,
};
use super::traits::{EditStore, OpenStore, ProjectSelector, StoreResult};
use crate::namespace;
use crate::query::{ActivityGroup, EditsQuery, RevertsQuery, TimeWindow, ORIGIN};

/// SQLite-backed edit store.
///
/// The schema mirrors the upstream ingest pipeline's tables: weekly
/// per-user-per-page edit aggregates, the page/user directories, the
/// project scope tables, the membership ledger, and revert history.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Wiki week of a stored datetime column, computed in SQL against the
/// shared origin. The SQL twin of `query::window::date_to_week`.
fn week_expr(column: &str) -> String {
    format!(
        "CAST((julianday({column}) - julianday('{origin}')) / 7 AS INTEGER)",
        origin = ORIGIN.format("%Y-%m-%d")
    )
}

/// Render an inlined integer IN-list from already-typed ids.
fn id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        id: row.get(0)?,
        title: row.get(1)?,
        created: row.get(2)?,
    })
}

fn project_page_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectPageRow> {
    Ok(ProjectPageRow {
        page_id: row.get(0)?,
        project_id: row.get(1)?,
        parent_category: row.get(2)?,
        title: row.get(3)?,
        namespace: row.get(4)?,
    })
}

fn active_page_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActivePageRow> {
    Ok(ActivePageRow {
        page_id: row.get(0)?,
        title: row.get(1)?,
        namespace: row.get(2)?,
        edits: row.get(3)?,
    })
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            -- User directory (anonymous editors carry negative ids)
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_groups (
                user_id INTEGER NOT NULL,
                grp TEXT NOT NULL
            );

            -- Page directory
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                namespace INTEGER NOT NULL
            );

            -- Weekly per-user-per-page edit aggregates
            CREATE TABLE IF NOT EXISTS edit_weeks (
                user_id INTEGER NOT NULL,
                page_id INTEGER NOT NULL,
                namespace INTEGER NOT NULL,
                week INTEGER NOT NULL,
                edits INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_edit_weeks_user
                ON edit_weeks(user_id, week);
            CREATE INDEX IF NOT EXISTS idx_edit_weeks_page
                ON edit_weeks(page_id, week);

            -- Project directory and scope
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS project_pages (
                page_id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                parent_category TEXT
            );

            CREATE TABLE IF NOT EXISTS page_assessments (
                page_id INTEGER PRIMARY KEY,
                assessment TEXT NOT NULL
            );

            -- Per-snapshot project activity
            CREATE TABLE IF NOT EXISTS project_activity (
                project_id INTEGER NOT NULL,
                page_id INTEGER NOT NULL,
                namespace INTEGER NOT NULL,
                edits INTEGER NOT NULL,
                week_from INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_project_activity_week
                ON project_activity(week_from, project_id);

            -- Membership ledger: link added/removed events
            CREATE TABLE IF NOT EXISTS project_links (
                project_id INTEGER NOT NULL,
                page_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                user_name TEXT NOT NULL,
                link_date TEXT NOT NULL,
                removed INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_project_links_project
                ON project_links(project_id, link_date);

            -- Revert history
            CREATE TABLE IF NOT EXISTS page_reverts (
                page_id INTEGER NOT NULL,
                revert_user INTEGER NOT NULL,
                revert_at TEXT NOT NULL
            );

            -- Geolocation of anonymous editor blocks
            CREATE TABLE IF NOT EXISTS user_blocks (
                user_name TEXT NOT NULL,
                block_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS geo_blocks (
                block_id INTEGER PRIMARY KEY,
                lat REAL NOT NULL,
                long REAL NOT NULL
            );

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    // === Seeding (used by the ingest side and by tests) ===

    pub fn insert_user(&self, id: i64, name: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO users (id, name) VALUES (?1, ?2)", params![id, name])?;
        Ok(())
    }

    pub fn insert_user_group(&self, user_id: i64, group: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_groups (user_id, grp) VALUES (?1, ?2)",
            params![user_id, group],
        )?;
        Ok(())
    }

    pub fn insert_page(&self, id: i64, title: &str, ns: i64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO pages (id, title, namespace) VALUES (?1, ?2, ?3)",
            params![id, title, ns],
        )?;
        Ok(())
    }

    pub fn record_edits(
        &self,
        user_id: i64,
        page_id: i64,
        ns: i64,
        week: i64,
        edits: i64,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO edit_weeks (user_id, page_id, namespace, week, edits)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, page_id, ns, week, edits],
        )?;
        Ok(())
    }

    pub fn insert_project(&self, id: i64, title: &str, created_at: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO projects (id, title, created_at) VALUES (?1, ?2, ?3)",
            params![id, title, created_at],
        )?;
        Ok(())
    }

    pub fn insert_project_page(
        &self,
        page_id: i64,
        project_id: i64,
        parent_category: Option<&str>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO project_pages (page_id, project_id, parent_category)
             VALUES (?1, ?2, ?3)",
            params![page_id, project_id, parent_category],
        )?;
        Ok(())
    }

    pub fn insert_assessment(&self, page_id: i64, assessment: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO page_assessments (page_id, assessment) VALUES (?1, ?2)",
            params![page_id, assessment],
        )?;
        Ok(())
    }

    pub fn record_activity(
        &self,
        project_id: i64,
        page_id: i64,
        ns: i64,
        edits: i64,
        week_from: i64,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO project_activity (project_id, page_id, namespace, edits, week_from)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![project_id, page_id, ns, edits, week_from],
        )?;
        Ok(())
    }

    pub fn record_link_event(
        &self,
        project_id: i64,
        page_id: i64,
        user_id: i64,
        user_name: &str,
        link_date: &str,
        removed: bool,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO project_links (project_id, page_id, user_id, user_name, link_date, removed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![project_id, page_id, user_id, user_name, link_date, removed as i64],
        )?;
        Ok(())
    }

    pub fn record_revert(&self, page_id: i64, revert_user: i64, revert_at: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO page_reverts (page_id, revert_user, revert_at) VALUES (?1, ?2, ?3)",
            params![page_id, revert_user, revert_at],
        )?;
        Ok(())
    }

    pub fn insert_user_block(&self, user_name: &str, block_id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_blocks (user_name, block_id) VALUES (?1, ?2)",
            params![user_name, block_id],
        )?;
        Ok(())
    }

    pub fn insert_geo_block(&self, block_id: i64, lat: f64, long: f64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO geo_blocks (block_id, lat, long) VALUES (?1, ?2, ?3)",
            params![block_id, lat, long],
        )?;
        Ok(())
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl EditStore for SqliteStore {
    async fn fetch_edits(&self, query: &EditsQuery) -> StoreResult<Vec<EditRow>> {
        let assessment_col = if query.needs_assessment() {
            "pa.assessment"
        } else {
            "NULL"
        };
        let assessment_join = if query.needs_assessment() {
            " LEFT JOIN page_assessments pa ON pa.page_id = ew.page_id"
        } else {
            ""
        };
        let project_join = if query.project_id.is_some() {
            " JOIN project_pages pp ON pp.page_id = ew.page_id"
        } else {
            ""
        };

        let sql = format!(
            "SELECT u.id, u.name, ew.page_id, ew.namespace, SUM(ew.edits) AS edits, \
             ew.week, p.title, ug.grp, {assessment_col} \
             FROM edit_weeks ew \
             JOIN users u ON ew.user_id = u.id \
             JOIN pages p ON ew.page_id = p.id \
             LEFT JOIN user_groups ug ON u.id = ug.user_id\
             {assessment_join}{project_join} \
             WHERE {where_clause} \
             GROUP BY {group_by} \
             ORDER BY {order}{limit}",
            where_clause = query.where_sql(),
            group_by = query.group.group_by_sql(),
            order = query.order_sql(),
            limit = query.limit_sql(),
        );
        debug!(%sql, "edit retrieval");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(query.params()), |row| {
            Ok(EditRow {
                user_id: row.get(0)?,
                user_name: row.get(1)?,
                page_id: row.get(2)?,
                page_namespace: row.get(3)?,
                edits: row.get(4)?,
                week: row.get(5)?,
                page_title: row.get(6)?,
                user_group: row.get(7)?,
                assessment: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn lookup_users_ci(&self, names: &[String]) -> StoreResult<Vec<UserIdent>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; names.len()].join(",");
        let sql = format!("SELECT id, name FROM users WHERE lower(name) IN ({placeholders})");
        debug!(%sql, "case-insensitive user lookup");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(names.iter().map(|n| n.to_lowercase())),
            |row| {
                Ok(UserIdent {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_reverts(&self, query: &RevertsQuery) -> StoreResult<Vec<RevertRow>> {
        let sql = format!(
            "SELECT u.name, {week} AS week, p.title, p.namespace, COUNT(u.name) AS cnt \
             FROM page_reverts r \
             JOIN pages p ON p.id = r.page_id \
             JOIN users u ON u.id = r.revert_user \
             WHERE {where_clause} \
             GROUP BY u.name, week \
             HAVING week >= ? AND week <= ?{limit}",
            week = week_expr("r.revert_at"),
            where_clause = query.where_sql(),
            limit = query.limit_sql(),
        );
        debug!(%sql, "revert retrieval");

        let mut values = query.params();
        values.push(query.window.start_week.into());
        values.push(query.window.end_week.into());

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(RevertRow {
                user: row.get(0)?,
                week: row.get(1)?,
                page_title: row.get(2)?,
                page_namespace: row.get(3)?,
                count: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_projects(&self, title_filter: Option<&str>) -> StoreResult<Vec<ProjectRow>> {
        let conn = self.conn.lock().unwrap();
        let rows = match title_filter {
            Some(title) => {
                let mut stmt = conn.prepare(
                    "SELECT id, title, created_at FROM projects WHERE title LIKE ?1",
                )?;
                let rows = stmt.query_map(params![format!("%{title}%")], project_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare("SELECT id, title, created_at FROM projects")?;
                let rows = stmt.query_map([], project_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    async fn fetch_project_pages(
        &self,
        selector: &ProjectSelector,
    ) -> StoreResult<Vec<ProjectPageRow>> {
        let base = "SELECT pp.page_id, pp.project_id, pp.parent_category, p.title, p.namespace \
                    FROM project_pages pp JOIN pages p ON pp.page_id = p.id";

        let conn = self.conn.lock().unwrap();
        let rows = match selector {
            ProjectSelector::Id(id) => {
                let sql = format!("{base} WHERE pp.project_id = ?1");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![id], project_page_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            ProjectSelector::Title(title) => {
                let sql = format!(
                    "{base} WHERE pp.project_id = \
                     (SELECT id FROM pages WHERE title = ?1 AND namespace = {ns})",
                    ns = namespace::PROJECT
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![title], project_page_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    async fn latest_activity_week(&self) -> StoreResult<Option<i64>> {
        let conn = self.conn.lock().unwrap();
        let week: Option<i64> =
            conn.query_row("SELECT MAX(week_from) FROM project_activity", [], |row| {
                row.get(0)
            })?;
        Ok(week)
    }

    async fn fetch_activity(
        &self,
        week_from: i64,
        groups: &[ActivityGroup],
    ) -> StoreResult<Vec<ActivityRow>> {
        let with_title = groups.contains(&ActivityGroup::Title);
        let (page_cols, page_join) = if with_title {
            (", pg.id, pg.title", " JOIN pages pg ON pa.page_id = pg.id")
        } else {
            ("", "")
        };
        let group_by = groups
            .iter()
            .map(|g| g.column())
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "SELECT pr.id, pr.title, pr.created_at, pa.namespace, \
             SUM(pa.edits) AS edits, COUNT(pa.page_id) AS pages{page_cols} \
             FROM projects pr \
             JOIN project_activity pa ON pa.project_id = pr.id{page_join} \
             WHERE pa.week_from = ?1 \
             GROUP BY {group_by} \
             ORDER BY edits DESC"
        );
        debug!(%sql, "activity retrieval");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![week_from], |row| {
            Ok(ActivityRow {
                project_id: row.get(0)?,
                project_title: row.get(1)?,
                project_created: row.get(2)?,
                namespace: row.get(3)?,
                edits: row.get(4)?,
                pages: row.get(5)?,
                page_id: if with_title { row.get(6)? } else { None },
                page_title: if with_title { row.get(7)? } else { None },
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_active_pages(
        &self,
        selector: &ProjectSelector,
        week_from: i64,
        limit: u32,
    ) -> StoreResult<Vec<ActivePageRow>> {
        let conn = self.conn.lock().unwrap();
        let rows = match selector {
            ProjectSelector::Id(id) => {
                let sql = format!(
                    "SELECT pa.page_id, p.title, p.namespace, pa.edits \
                     FROM project_activity pa JOIN pages p ON p.id = pa.page_id \
                     WHERE pa.project_id = ?1 AND pa.week_from = ?2 \
                     ORDER BY pa.edits DESC LIMIT {limit}"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![id, week_from], active_page_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            ProjectSelector::Title(title) => {
                let sql = format!(
                    "SELECT pa.page_id, p.title, p.namespace, pa.edits \
                     FROM project_activity pa \
                     JOIN pages p ON p.id = pa.page_id \
                     JOIN projects pr ON pr.id = pa.project_id \
                     WHERE pr.title = ?1 AND pa.week_from = ?2 \
                     ORDER BY pa.edits DESC LIMIT {limit}"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![title, week_from], active_page_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    async fn project_page_ids(&self, title: &str) -> StoreResult<Vec<i64>> {
        let sql = format!(
            "SELECT id FROM pages WHERE (title LIKE ?1 OR title = ?2) AND namespace = {ns}",
            ns = namespace::PROJECT
        );
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![format!("{title}/%"), title], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_link_events(
        &self,
        page_ids: &[i64],
        end_week: i64,
    ) -> StoreResult<Vec<LinkEvent>> {
        if page_ids.is_empty() {
            return Ok(Vec::new());
        }
        let week = week_expr("pl.link_date");
        let sql = format!(
            "SELECT pl.project_id, pl.page_id, pl.user_id, pl.user_name, \
             {week} AS week, pl.removed, pl.link_date, p.title, p.namespace \
             FROM project_links pl \
             JOIN pages p ON pl.page_id = p.id \
             WHERE pl.project_id IN ({ids}) AND {week} <= ?1 \
             ORDER BY pl.link_date ASC",
            ids = id_list(page_ids),
        );
        debug!(%sql, "link ledger retrieval");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![end_week], |row| {
            Ok(LinkEvent {
                project_id: row.get(0)?,
                page_id: row.get(1)?,
                user_id: row.get(2)?,
                user_name: row.get(3)?,
                week: row.get(4)?,
                removed: row.get::<_, i64>(5)? != 0,
                link_date: row.get(6)?,
                page_title: row.get(7)?,
                page_namespace: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn fetch_anon_editors(
        &self,
        page: &str,
        ns: i64,
        window: TimeWindow,
    ) -> StoreResult<Vec<AnonEditorRow>> {
        let sql = "SELECT u.name, SUM(ew.edits) AS edits, ew.week, g.lat, g.long \
                   FROM edit_weeks ew \
                   JOIN users u ON u.id = ew.user_id \
                   LEFT JOIN user_blocks ub ON u.name = ub.user_name \
                   JOIN geo_blocks g ON ub.block_id = g.block_id \
                   WHERE ew.page_id = \
                     (SELECT id FROM pages WHERE title = ?1 AND namespace = ?2) \
                   AND ew.user_id < 0 AND ub.block_id IS NOT NULL \
                   AND ew.week >= ?3 AND ew.week <= ?4 \
                   GROUP BY u.name";

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(
            params![page, ns, window.start_week, window.end_week],
            |row| {
                Ok(AnonEditorRow {
                    user_name: row.get(0)?,
                    edits: row.get(1)?,
                    week: row.get(2)?,
                    lat: row.get(3)?,
                    long: row.get(4)?,
                })
            },
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
