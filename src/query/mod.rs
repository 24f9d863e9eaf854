//! Query composition for wiki edit history.
//!
//! Pure builders that turn loosely-typed request parameters into safe,
//! composable retrieval requests: time windows, filter fragments,
//! grouping specs, and the composed query structs the store executes.

pub mod group;
pub mod predicate;
pub mod spec;
pub mod window;

pub use group::{ActivityGroup, GroupKey, GroupSpec};
pub use predicate::{
    id_list_fragment, id_set_fragment, namespace_fragment, page_fragment,
    page_week_fragment, user_fragment, Fragment,
};
pub use spec::{EditsQuery, Order, RevertsQuery, SortDirection};
pub use window::{date_to_week, parse_date, week_to_date, TimeWindow, ORIGIN};
