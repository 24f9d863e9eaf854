//! Grouping specifications.
//!
//! A group spec is an ordered, de-duplicated list of dimension tokens.
//! It drives two things independently: the retrieval grouping columns,
//! and which optional fields appear in output records.

/// A grouping dimension for edit queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    User,
    Page,
    Date,
    Assessment,
}

impl GroupKey {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "user" => Some(Self::User),
            "page" => Some(Self::Page),
            "date" => Some(Self::Date),
            "assessment" => Some(Self::Assessment),
            _ => None,
        }
    }

    /// The retrieval grouping column this dimension maps to.
    pub fn column(self) -> &'static str {
        match self {
            Self::User => "u.name",
            Self::Page => "ew.page_id",
            Self::Date => "ew.week",
            Self::Assessment => "pa.assessment",
        }
    }
}

/// Ordered, de-duplicated grouping dimensions. Unrecognized tokens are
/// dropped; an empty result defaults to grouping by user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    keys: Vec<GroupKey>,
}

impl Default for GroupSpec {
    fn default() -> Self {
        Self { keys: vec![GroupKey::User] }
    }
}

impl GroupSpec {
    pub fn parse(raw: &str) -> Self {
        let mut keys = Vec::new();
        for token in raw.split('|') {
            if let Some(key) = GroupKey::parse(token) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        if keys.is_empty() {
            Self::default()
        } else {
            Self { keys }
        }
    }

    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    /// Comma-joined grouping columns, in request order.
    pub fn group_by_sql(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.column())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn includes(&self, key: GroupKey) -> bool {
        self.keys.contains(&key)
    }

    /// Whether output records carry page info fields.
    pub fn includes_page(&self) -> bool {
        self.includes(GroupKey::Page)
    }

    /// Whether output records carry the week field.
    pub fn includes_date(&self) -> bool {
        self.includes(GroupKey::Date)
    }

    /// Whether output records carry the assessment field.
    pub fn includes_assessment(&self) -> bool {
        self.includes(GroupKey::Assessment)
    }
}

/// A grouping dimension for project-activity queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityGroup {
    Project,
    Namespace,
    Title,
}

impl ActivityGroup {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "project" => Some(Self::Project),
            "namespace" => Some(Self::Namespace),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Project => "pa.project_id",
            Self::Namespace => "pa.namespace",
            Self::Title => "pa.page_id",
        }
    }

    /// Parse a pipe-delimited activity group list; unknown tokens are
    /// dropped, an empty result defaults to per-project grouping.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut groups = Vec::new();
        for token in raw.split('|') {
            if let Some(g) = Self::parse(token) {
                if !groups.contains(&g) {
                    groups.push(g);
                }
            }
        }
        if groups.is_empty() {
            groups.push(Self::Project);
        }
        groups
    }
}
