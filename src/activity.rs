//! Project-activity matrix compression.
//!
//! Folds grouped activity rows into one dense record per project: an
//! explicit zero-filled edit counter for every namespace in the fixed
//! vocabulary, plus total rollups. Built to shrink the transfer size of
//! per-project/per-namespace result sets without losing the breakdown.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Serialize;

use crate::namespace::{self, MATRIX_NAMESPACES};
use crate::store::ActivityRow;

/// One project's dense activity matrix.
///
/// The flattened map carries one entry per vocabulary namespace id
/// (stringified, as JSON object keys), zero-filled when the project had
/// no activity there.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectActivity {
    pub project_id: i64,
    pub project_title: String,
    pub project_created: String,
    pub total_edits: i64,
    pub total_pages: i64,
    /// Pages in the project and project-talk namespaces.
    pub total_project_pages: i64,
    #[serde(flatten)]
    pub edits_by_namespace: BTreeMap<String, i64>,
}

impl ProjectActivity {
    fn new(row: &ActivityRow) -> Self {
        let edits_by_namespace = MATRIX_NAMESPACES
            .iter()
            .map(|ns| (ns.to_string(), 0))
            .collect();
        Self {
            project_id: row.project_id,
            project_title: row.project_title.clone(),
            project_created: row.project_created.clone(),
            total_edits: 0,
            total_pages: 0,
            total_project_pages: 0,
            edits_by_namespace,
        }
    }

    /// Edit count for one namespace column.
    pub fn namespace_edits(&self, ns: i64) -> Option<i64> {
        self.edits_by_namespace.get(&ns.to_string()).copied()
    }
}

/// Fold activity rows into one record per project, in first-appearance
/// order (rows arrive most-edited first, so projects do too).
///
/// A namespace id outside the vocabulary still counts toward the
/// totals; it just has no dedicated column.
pub fn compress(rows: &[ActivityRow]) -> Vec<ProjectActivity> {
    let mut order: Vec<i64> = Vec::new();
    let mut by_project: HashMap<i64, ProjectActivity> = HashMap::new();

    for row in rows {
        let record = by_project.entry(row.project_id).or_insert_with(|| {
            order.push(row.project_id);
            ProjectActivity::new(row)
        });

        if let Some(counter) = record.edits_by_namespace.get_mut(&row.namespace.to_string()) {
            *counter += row.edits;
        }
        record.total_edits += row.edits;
        record.total_pages += row.pages;
        if row.namespace == namespace::PROJECT || row.namespace == namespace::PROJECT_TALK {
            record.total_project_pages += row.pages;
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_project.remove(&id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(project_id: i64, ns: i64, edits: i64, pages: i64) -> ActivityRow {
        ActivityRow {
            project_id,
            project_title: format!("Project{project_id}"),
            project_created: "2006-01-01".to_string(),
            namespace: ns,
            page_id: None,
            page_title: None,
            edits,
            pages,
        }
    }

    #[test]
    fn folds_namespaces_into_one_record_per_project() {
        let rows = vec![row(1, 0, 50, 5), row(1, 1, 20, 3), row(2, 0, 10, 1)];
        let matrix = compress(&rows);

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0].project_id, 1);
        assert_eq!(matrix[0].namespace_edits(0), Some(50));
        assert_eq!(matrix[0].namespace_edits(1), Some(20));
        assert_eq!(matrix[0].total_edits, 70);
        assert_eq!(matrix[0].total_pages, 8);
    }

    #[test]
    fn every_vocabulary_namespace_is_zero_filled() {
        let matrix = compress(&[row(1, 0, 50, 5)]);
        for ns in MATRIX_NAMESPACES {
            let expected = if *ns == 0 { 50 } else { 0 };
            assert_eq!(matrix[0].namespace_edits(*ns), Some(expected));
        }
    }

    #[test]
    fn project_namespaces_roll_into_project_pages() {
        let rows = vec![row(1, 4, 30, 2), row(1, 5, 10, 1), row(1, 0, 5, 4)];
        let matrix = compress(&rows);
        assert_eq!(matrix[0].total_project_pages, 3);
        assert_eq!(matrix[0].total_pages, 7);
    }

    #[test]
    fn unknown_namespace_counts_toward_totals_only() {
        let rows = vec![row(1, 0, 5, 1), row(1, 12345, 7, 2)];
        let matrix = compress(&rows);
        assert_eq!(matrix[0].total_edits, 12);
        assert_eq!(matrix[0].total_pages, 3);
        assert_eq!(matrix[0].namespace_edits(12345), None);
    }

    #[test]
    fn preserves_row_order_of_projects() {
        let rows = vec![row(7, 0, 100, 1), row(3, 0, 50, 1), row(7, 1, 10, 1)];
        let matrix = compress(&rows);
        assert_eq!(matrix[0].project_id, 7);
        assert_eq!(matrix[1].project_id, 3);
    }

    #[test]
    fn serialized_record_is_flat() {
        let matrix = compress(&[row(1, 0, 5, 1)]);
        let json = serde_json::to_value(&matrix[0]).unwrap();
        assert_eq!(json["total_edits"], 5);
        assert_eq!(json["0"], 5);
        assert_eq!(json["2600"], 0);
    }
}
