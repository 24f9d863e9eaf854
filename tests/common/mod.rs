//! Common test utilities: a seeded in-memory store with a small but
//! realistic slice of edit history.
//!
//! The dataset covers every endpoint: registered and anonymous editors,
//! a bot, two projects with activity snapshots, a membership ledger,
//! reverts, and geolocated blocks.

use reflex::query::week_to_date;
use reflex::{OpenStore, SqliteStore};

/// Format a wiki week as the `YYYYMMDD` request-date for its first day.
pub fn week_as_date(week: i64) -> String {
    week_to_date(week).format("%Y%m%d").to_string()
}

/// Format a wiki week as a stored ledger timestamp (its first instant).
pub fn week_as_timestamp(week: i64) -> String {
    week_to_date(week).format("%Y-%m-%d 00:00:00").to_string()
}

pub fn fixture_store() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();

    // Users: two humans, a bot, an anonymous editor (negative id).
    store.insert_user(1, "Alice").unwrap();
    store.insert_user(2, "Bob").unwrap();
    store.insert_user(3, "CleverBot").unwrap();
    store.insert_user(-5, "192.0.2.7").unwrap();
    store.insert_user_group(3, "bot").unwrap();

    // Pages.
    store.insert_page(10, "Cats", 0).unwrap();
    store.insert_page(11, "Talk:Cats", 1).unwrap();
    store.insert_page(20, "WikiProject_Cats", 4).unwrap();
    store.insert_page(21, "WikiProject_Cats/Members", 4).unwrap();
    store.insert_page(25, "WikiProject_Dogs", 4).unwrap();
    store.insert_page(30, "Dogs", 0).unwrap();
    store.insert_assessment(10, "GA").unwrap();

    // Weekly edit aggregates around week 450.
    store.record_edits(1, 10, 0, 450, 5).unwrap();
    store.record_edits(1, 10, 0, 451, 3).unwrap();
    store.record_edits(2, 10, 0, 450, 7).unwrap();
    store.record_edits(2, 11, 1, 450, 2).unwrap();
    store.record_edits(3, 10, 0, 450, 50).unwrap();
    store.record_edits(-5, 10, 0, 450, 4).unwrap();
    store.record_edits(1, 30, 0, 452, 1).unwrap();

    // Projects and their page scopes. A project's id is the id of its
    // page in the project namespace.
    store
        .insert_project(20, "WikiProject_Cats", "2006-05-01 00:00:00")
        .unwrap();
    store
        .insert_project(25, "WikiProject_Dogs", "2007-02-01 00:00:00")
        .unwrap();
    store.insert_project_page(10, 20, Some("Cats")).unwrap();
    store.insert_project_page(30, 25, Some("Dogs")).unwrap();

    // Activity snapshots: an older one at week 690 that must be
    // ignored, and the latest at week 700.
    store.record_activity(20, 10, 0, 100, 690).unwrap();
    store.record_activity(20, 10, 0, 40, 700).unwrap();
    store.record_activity(20, 20, 4, 10, 700).unwrap();
    store.record_activity(20, 21, 4, 5, 700).unwrap();
    store.record_activity(25, 30, 0, 8, 700).unwrap();

    // Membership ledger on the project's own page (id 20): Alice joins
    // at week 100 and leaves at week 150; Bob joins at week 130 and
    // stays.
    store
        .record_link_event(20, 20, 1, "Alice", &week_as_timestamp(100), false)
        .unwrap();
    store
        .record_link_event(20, 20, 1, "Alice", &week_as_timestamp(150), true)
        .unwrap();
    store
        .record_link_event(20, 20, 2, "Bob", &week_as_timestamp(130), false)
        .unwrap();

    // One revert by Bob on Cats during week 455.
    store
        .record_revert(10, 2, &week_as_timestamp(455))
        .unwrap();

    // Geolocation for the anonymous editor.
    store.insert_user_block("192.0.2.7", 1).unwrap();
    store.insert_geo_block(1, 47.65, -122.3).unwrap();

    store
}
