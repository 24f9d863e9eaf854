//! End-to-end scenarios: requests in, payloads out, against a seeded
//! in-memory store.

mod common;

use std::sync::Arc;

use common::{fixture_store, week_as_date};
use reflex::api::params::{
    ActivePagesRequest, ActiveProjectsRequest, AnonCoordsRequest, EditsRequest,
    MembersRequest, ProjectPagesRequest, ProjectsRequest, RevertsRequest,
};
use reflex::api::ActiveProjectsResult;
use reflex::{ApiError, MemberTo, ReflexApi};

fn api() -> ReflexApi {
    ReflexApi::new(Arc::new(fixture_store()))
}

fn edits_request() -> EditsRequest {
    EditsRequest {
        sw: Some("440".to_string()),
        ew: Some("460".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn edits_requires_some_filter() {
    let err = api().edits(&edits_request()).await.unwrap_err();
    let ApiError::MissingArgument(message) = err else {
        panic!("expected a validation failure");
    };
    assert!(message.contains("'user'"));
}

#[tokio::test]
async fn edits_by_user_aggregates_article_namespace() {
    let mut req = edits_request();
    req.user = Some("Alice|Bob".to_string());
    let rows = api().edits(&req).await.unwrap();

    // Default namespace 0: Alice 5+3+1, Bob 7 (the Talk edit is ns 1).
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].user_name, "Alice");
    assert_eq!(rows[0].edits, 9);
    assert_eq!(rows[1].user_name, "Bob");
    assert_eq!(rows[1].edits, 7);
    // User-grouped shape: no page fields.
    assert!(rows[0].page_title.is_none());
    assert!(rows[0].week.is_none());
}

#[tokio::test]
async fn edits_namespace_names_widen_the_scope() {
    let mut req = edits_request();
    req.user = Some("Bob".to_string());
    req.namespace = Some("Article|Talk".to_string());
    req.group = Some("page|user".to_string());
    let rows = api().edits(&req).await.unwrap();

    let namespaces: Vec<i64> = rows.iter().filter_map(|r| r.page_namespace).collect();
    assert!(namespaces.contains(&0));
    assert!(namespaces.contains(&1));
}

#[tokio::test]
async fn edits_exclude_bots_drops_the_bot_group() {
    let mut req = edits_request();
    req.page = Some("Cats".to_string());
    let rows = api().edits(&req).await.unwrap();
    assert!(rows.iter().any(|r| r.user_name == "CleverBot"));

    req.exclude_bots = Some("1".to_string());
    let rows = api().edits(&req).await.unwrap();
    assert!(!rows.iter().any(|r| r.user_name == "CleverBot"));
    // The anonymous editor has no group row and survives the guard.
    assert!(rows.iter().any(|r| r.user_name == "192.0.2.7"));
}

#[tokio::test]
async fn edits_assessment_flag_exposes_assessment() {
    let mut req = edits_request();
    req.user = Some("Alice".to_string());
    req.group = Some("page|user".to_string());
    req.assessment = Some("1".to_string());
    let rows = api().edits(&req).await.unwrap();

    let cats = rows.iter().find(|r| r.page_title.as_deref() == Some("Cats")).unwrap();
    assert_eq!(cats.assessment.as_deref(), Some("GA"));
    // Dogs has no recorded assessment.
    let dogs = rows.iter().find(|r| r.page_title.as_deref() == Some("Dogs")).unwrap();
    assert!(dogs.assessment.is_none());
}

#[tokio::test]
async fn edits_pageweek_pins_weeks_per_page() {
    let mut req = edits_request();
    req.page_week = Some("Cats|450|Dogs|452".to_string());
    req.group = Some("page|user|date".to_string());
    let rows = api().edits(&req).await.unwrap();

    for row in &rows {
        match row.page_title.as_deref() {
            Some("Cats") => assert_eq!(row.week, Some(450)),
            Some("Dogs") => assert_eq!(row.week, Some(452)),
            other => panic!("unexpected page {other:?}"),
        }
    }
}

#[tokio::test]
async fn edits_projectid_scopes_to_project_pages() {
    let mut req = edits_request();
    req.user = Some("Alice".to_string());
    req.project_id = Some("25".to_string());
    req.group = Some("page|user".to_string());
    let rows = api().edits(&req).await.unwrap();

    // Only Dogs is in WikiProject_Dogs' scope.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].page_title.as_deref(), Some("Dogs"));
}

// --- The three-stage case-insensitive retry protocol ---

#[tokio::test]
async fn retry_corrects_case_folded_names() {
    let mut req = edits_request();
    req.user = Some("alice".to_string());
    let rows = api().edits(&req).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_name, "Alice");
    assert_eq!(rows[0].edits, 9);
}

#[tokio::test]
async fn retry_excludes_names_that_already_matched_exactly() {
    // "Alice" exists with this exact case but has no edits in this
    // window; stage 2 finds her, stage 3 must not re-query her.
    let mut req = edits_request();
    req.user = Some("Alice".to_string());
    req.sw = Some("1".to_string());
    req.ew = Some("2".to_string());
    let rows = api().edits(&req).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn retry_fails_for_unknown_users() {
    let mut req = edits_request();
    req.user = Some("Nobody".to_string());
    let err = api().edits(&req).await.unwrap_err();
    let ApiError::NoMatchingUser(names) = err else {
        panic!("expected the no-matching-user outcome");
    };
    assert_eq!(names, "Nobody");
}

// --- Reverts ---

#[tokio::test]
async fn reverts_require_user_and_count_per_week() {
    let err = api().reverts(&RevertsRequest::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingArgument(_)));

    let req = RevertsRequest {
        user: Some("Bob".to_string()),
        sw: Some("440".to_string()),
        ew: Some("460".to_string()),
        ..Default::default()
    };
    let rows = api().reverts(&req).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user, "Bob");
    assert_eq!(rows[0].week, 455);
    assert_eq!(rows[0].count, 1);
    assert_eq!(rows[0].page_title, "Cats");
}

// --- Projects and project pages ---

#[tokio::test]
async fn projects_filter_by_title_substring() {
    let all = api().projects(&ProjectsRequest::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let req = ProjectsRequest { title: Some("Dogs".to_string()) };
    let dogs = api().projects(&req).await.unwrap();
    assert_eq!(dogs.len(), 1);
    assert_eq!(dogs[0].title, "WikiProject_Dogs");
}

#[tokio::test]
async fn project_pages_keyed_by_supplied_identifier() {
    let req = ProjectPagesRequest {
        project: Some("WikiProject_Cats".to_string()),
        ..Default::default()
    };
    let by_title = api().project_pages(&req).await.unwrap();
    assert_eq!(by_title["WikiProject_Cats"].len(), 1);
    assert_eq!(by_title["WikiProject_Cats"][0].title, "Cats");

    let req = ProjectPagesRequest {
        page_id: Some("25".to_string()),
        ..Default::default()
    };
    let by_id = api().project_pages(&req).await.unwrap();
    assert_eq!(by_id["25"][0].title, "Dogs");
}

// --- Activity ---

#[tokio::test]
async fn active_projects_scope_to_latest_snapshot() {
    let req = ActiveProjectsRequest {
        group: Some("project".to_string()),
        ..Default::default()
    };
    let ActiveProjectsResult::Rows(rows) = api().active_projects(&req).await.unwrap()
    else {
        panic!("expected plain rows without compression");
    };

    // Week-690 numbers must not leak in: WikiProject_Cats sums to 55.
    let cats = rows.iter().find(|r| r.project_id == 20).unwrap();
    assert_eq!(cats.edits, 55);
    assert_eq!(cats.pages, 3);
    assert_eq!(rows[0].project_id, 20); // most edits first
}

#[tokio::test]
async fn active_projects_compress_builds_the_matrix() {
    let req = ActiveProjectsRequest {
        group: Some("project|namespace".to_string()),
        compress: Some("project".to_string()),
    };
    let ActiveProjectsResult::Matrix(matrix) = api().active_projects(&req).await.unwrap()
    else {
        panic!("expected the compressed matrix");
    };

    let cats = matrix.iter().find(|p| p.project_id == 20).unwrap();
    assert_eq!(cats.namespace_edits(0), Some(40));
    assert_eq!(cats.namespace_edits(4), Some(15));
    // Zero-filled columns for untouched namespaces.
    assert_eq!(cats.namespace_edits(1), Some(0));
    assert_eq!(cats.namespace_edits(2600), Some(0));
    assert_eq!(cats.total_edits, 55);
    assert_eq!(cats.total_pages, 3);
    assert_eq!(cats.total_project_pages, 2);
}

#[tokio::test]
async fn active_pages_rank_within_one_project() {
    let req = ActivePagesRequest {
        project: Some("WikiProject_Cats".to_string()),
        ..Default::default()
    };
    let rows = api().active_project_pages(&req).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].title, "Cats");
    assert_eq!(rows[0].edits, 40);

    let req = ActivePagesRequest {
        project_id: Some("20".to_string()),
        limit: Some("1".to_string()),
        ..Default::default()
    };
    let rows = api().active_project_pages(&req).await.unwrap();
    assert_eq!(rows.len(), 1);
}

// --- Membership reconstruction ---

#[tokio::test]
async fn members_report_a_window_bounded_membership() {
    // Alice joined at week 100 and left at week 150; the window
    // [120, 200] sees both bounds.
    let req = MembersRequest {
        project: Some("WikiProject_Cats".to_string()),
        sd: Some(week_as_date(120)),
        ed: Some(week_as_date(200)),
        ..Default::default()
    };
    let members = api().project_members(&req).await.unwrap();

    let alice = &members["Alice"][&20];
    assert!(matches!(alice.member_to, MemberTo::Until(_)));
    assert_eq!(alice.link_count, 0);
    assert_eq!(alice.page_title, "WikiProject_Cats");

    let bob = &members["Bob"][&20];
    assert_eq!(bob.member_to, MemberTo::Current);
    assert_eq!(bob.link_count, 1);
}

#[tokio::test]
async fn members_departed_before_the_window_are_invisible() {
    // Same ledger, window [160, 200]: Alice's last link vanished at
    // week 150, before the window opened.
    let req = MembersRequest {
        project: Some("WikiProject_Cats".to_string()),
        sd: Some(week_as_date(160)),
        ed: Some(week_as_date(200)),
        ..Default::default()
    };
    let members = api().project_members(&req).await.unwrap();

    assert!(!members.contains_key("Alice"));
    assert!(members.contains_key("Bob"));
}

#[tokio::test]
async fn members_accept_explicit_page_ids() {
    let req = MembersRequest {
        page_id: Some("20|21".to_string()),
        sd: Some(week_as_date(120)),
        ed: Some(week_as_date(200)),
        ..Default::default()
    };
    let members = api().project_members(&req).await.unwrap();
    assert!(members.contains_key("Alice"));
    assert!(members.contains_key("Bob"));
}

// --- Anonymous editor coordinates ---

#[tokio::test]
async fn anon_coords_return_geolocated_editors() {
    let req = AnonCoordsRequest {
        page: Some("Cats".to_string()),
        namespace: Some("0".to_string()),
        sd: Some(week_as_date(440)),
        ed: Some(week_as_date(460)),
    };
    let rows = api().anon_coords(&req).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_name, "192.0.2.7");
    assert_eq!(rows[0].edits, 4);
    assert!((rows[0].lat - 47.65).abs() < 1e-9);
}

#[tokio::test]
async fn anon_coords_require_page_and_namespace() {
    let req = AnonCoordsRequest {
        page: Some("Cats".to_string()),
        ..Default::default()
    };
    let err = api().anon_coords(&req).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingArgument(_)));
}
