//! Store adapters for the edit-history dataset.
//!
//! The query core composes retrieval requests against the `EditStore`
//! trait; `SqliteStore` is the bundled implementation.

mod rows;
mod sqlite;
mod traits;

pub use rows::{
    ActivePageRow, ActivityRow, AnonEditorRow, EditRow, LinkEvent, ProjectPageRow,
    ProjectRow, RevertRow, UserIdent,
};
pub use sqlite::SqliteStore;
pub use traits::{EditStore, OpenStore, ProjectSelector, StoreError, StoreResult};
