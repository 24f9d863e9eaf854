//! Membership-timeline reconstruction.
//!
//! Rebuilds, from the ordered add/remove link ledger, which users were
//! members of which project pages during a request window. One
//! synchronous pass, no I/O, rebuilt from scratch per request — there
//! is no incremental membership state anywhere.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::query::TimeWindow;
use crate::store::LinkEvent;

/// When a membership ended. Serializes as the closing timestamp, or
/// the `"current"` sentinel for a still-open membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberTo {
    Current,
    Until(String),
}

impl Serialize for MemberTo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Current => serializer.serialize_str("current"),
            Self::Until(ts) => serializer.serialize_str(ts),
        }
    }
}

/// One `(user, project page)` membership with its window bounds.
///
/// `link_count` can be negative when the ledger holds more removals
/// than additions (incomplete pre-origin history); it is reported
/// as-is, never clamped.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipRecord {
    pub page_title: String,
    pub page_namespace: i64,
    pub page_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub link_count: i64,
    pub member_since: String,
    pub member_to: MemberTo,
}

/// Memberships keyed by user name, then page id.
pub type MemberMap = BTreeMap<String, BTreeMap<i64, MembershipRecord>>;

/// Replay the ledger against a window.
///
/// Events must arrive in ascending timestamp order (the store contract);
/// this pass trusts that ordering and never re-sorts. Per pair:
///
/// - an addition opens the record (or re-opens a closed one, clearing
///   `member_to` back to current) and increments the count;
/// - a removal decrements; a count reaching exactly zero closes the
///   record at that event's timestamp when the event falls at or after
///   the window start, and discards it entirely when it falls strictly
///   before — that user was never a member as far as this window is
///   concerned.
///
/// A user whose every page record was discarded is absent from the
/// result.
pub fn reconstruct(events: &[LinkEvent], window: TimeWindow) -> MemberMap {
    let mut members: MemberMap = BTreeMap::new();

    for event in events {
        let pages = members.entry(event.user_name.clone()).or_default();
        let record = pages.entry(event.page_id).or_insert_with(|| MembershipRecord {
            page_title: event.page_title.clone(),
            page_namespace: event.page_namespace,
            page_id: event.page_id,
            user_id: event.user_id,
            user_name: event.user_name.clone(),
            link_count: 0,
            member_since: event.link_date.clone(),
            member_to: MemberTo::Current,
        });

        if event.removed {
            record.link_count -= 1;
            if record.link_count == 0 {
                if event.week < window.start_week {
                    // Last link gone before the window opened: this pair
                    // was never a member for this request.
                    pages.remove(&event.page_id);
                } else {
                    record.member_to = MemberTo::Until(event.link_date.clone());
                }
            }
        } else {
            if record.link_count == 0 {
                record.member_to = MemberTo::Current;
            }
            record.link_count += 1;
        }
    }

    members.retain(|_, pages| !pages.is_empty());
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(user: &str, page_id: i64, week: i64, removed: bool) -> LinkEvent {
        LinkEvent {
            project_id: page_id,
            page_id,
            user_id: 1,
            user_name: user.to_string(),
            week,
            removed,
            link_date: format!("w{week}"),
            page_title: format!("page{page_id}"),
            page_namespace: 4,
        }
    }

    fn window(start: i64, end: i64) -> TimeWindow {
        TimeWindow { start_week: start, end_week: end }
    }

    // === Scenario: membership closed inside the window is reported ===
    #[test]
    fn close_inside_window_keeps_record_with_member_to() {
        let ledger = vec![
            event("userA", 1, 100, false),
            event("userA", 1, 150, true),
        ];
        let members = reconstruct(&ledger, window(120, 200));

        let record = &members["userA"][&1];
        assert_eq!(record.member_since, "w100");
        assert_eq!(record.member_to, MemberTo::Until("w150".to_string()));
        assert_eq!(record.link_count, 0);
    }

    // === Scenario: membership closed before the window is invisible ===
    #[test]
    fn close_before_window_discards_pair() {
        let ledger = vec![
            event("userA", 1, 100, false),
            event("userA", 1, 150, true),
        ];
        let members = reconstruct(&ledger, window(160, 200));
        assert!(members.is_empty());
    }

    #[test]
    fn balanced_pre_window_ledger_yields_nothing() {
        let ledger = vec![
            event("userA", 1, 10, false),
            event("userA", 1, 20, false),
            event("userA", 1, 30, true),
            event("userA", 1, 40, true),
        ];
        assert!(reconstruct(&ledger, window(100, 200)).is_empty());
    }

    #[test]
    fn extra_links_keep_membership_open() {
        let ledger = vec![
            event("userA", 1, 100, false),
            event("userA", 1, 110, false),
            event("userA", 1, 150, true),
        ];
        let members = reconstruct(&ledger, window(120, 200));
        let record = &members["userA"][&1];
        assert_eq!(record.link_count, 1);
        assert_eq!(record.member_to, MemberTo::Current);
    }

    #[test]
    fn readd_after_close_reopens_membership() {
        let ledger = vec![
            event("userA", 1, 100, false),
            event("userA", 1, 130, true),
            event("userA", 1, 140, false),
        ];
        let members = reconstruct(&ledger, window(120, 200));
        let record = &members["userA"][&1];
        assert_eq!(record.link_count, 1);
        assert_eq!(record.member_to, MemberTo::Current);
        // The original join date is preserved across the gap.
        assert_eq!(record.member_since, "w100");
    }

    #[test]
    fn removal_heavy_ledger_goes_negative_unclamped() {
        let ledger = vec![
            event("userA", 1, 100, true),
            event("userA", 1, 110, true),
        ];
        let members = reconstruct(&ledger, window(50, 200));
        let record = &members["userA"][&1];
        assert_eq!(record.link_count, -2);
        // Never hit exactly zero, so the record is neither closed nor
        // discarded.
        assert_eq!(record.member_to, MemberTo::Current);
    }

    #[test]
    fn user_survives_on_one_of_two_pages() {
        let ledger = vec![
            event("userA", 1, 10, false),
            event("userA", 1, 20, true), // closed pre-window: discarded
            event("userA", 2, 100, false),
        ];
        let members = reconstruct(&ledger, window(50, 200));
        let pages = &members["userA"];
        assert_eq!(pages.len(), 1);
        assert!(pages.contains_key(&2));
    }

    #[test]
    fn close_exactly_at_start_week_is_reported() {
        let ledger = vec![
            event("userA", 1, 100, false),
            event("userA", 1, 160, true),
        ];
        let members = reconstruct(&ledger, window(160, 200));
        assert_eq!(
            members["userA"][&1].member_to,
            MemberTo::Until("w160".to_string())
        );
    }

    #[test]
    fn member_to_serializes_sentinel_and_timestamp() {
        assert_eq!(
            serde_json::to_string(&MemberTo::Current).unwrap(),
            "\"current\""
        );
        assert_eq!(
            serde_json::to_string(&MemberTo::Until("w150".to_string())).unwrap(),
            "\"w150\""
        );
    }
}
