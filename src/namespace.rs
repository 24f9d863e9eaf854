//! The namespace vocabulary — a closed mapping between namespace names
//! and their small integer ids.
//!
//! Kept as a compile-time table so no request ever joins against a
//! namespace table; the vocabulary is process-wide and immutable.

/// Canonical (id, name) pairs. `Project` is accepted as a synonym for
/// `Wikipedia` on lookup but never produced by [`name`].
const NAMESPACES: &[(i64, &str)] = &[
    (0, "Article"),
    (1, "Talk"),
    (2, "User"),
    (3, "User_talk"),
    (4, "Wikipedia"),
    (5, "Wikipedia_talk"),
    (6, "File"),
    (7, "File_talk"),
    (8, "Mediawiki"),
    (9, "Mediawiki_talk"),
    (10, "Template"),
    (11, "Template_talk"),
    (12, "Help"),
    (13, "Help_talk"),
    (14, "Category"),
    (15, "Category_talk"),
    (100, "Portal"),
    (101, "Portal_talk"),
    (108, "Book"),
    (109, "Book_talk"),
];

/// Namespace ids with a dedicated column in the activity matrix.
///
/// Wider than the named vocabulary above: the matrix also carries ids
/// that exist in recorded activity but have no canonical name here.
pub const MATRIX_NAMESPACES: &[i64] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 100, 101, 108, 109,
    118, 119, 446, 447, 710, 711, 828, 829, 2600,
];

/// The project namespace (project pages live here).
pub const PROJECT: i64 = 4;
/// The project-talk namespace.
pub const PROJECT_TALK: i64 = 5;

/// Resolve a namespace name to its id. `None` for unknown names.
pub fn id(name: &str) -> Option<i64> {
    if name == "Project" {
        return Some(PROJECT);
    }
    NAMESPACES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(id, _)| *id)
}

/// Resolve a namespace id to its canonical name. `None` for ids outside
/// the named vocabulary.
pub fn name(id: i64) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(i, _)| *i == id)
        .map(|(_, n)| *n)
}
