// core/engine/src/interaction.rs

use crate::types::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Value written for a wishlist entry without a rating
pub const WISHLIST_INTERACTION: f64 = 1.0;

/// Dense user × project interaction table
///
/// Rows follow the order users were supplied in, columns the order of
/// projects. Cells default to 0; a wishlist entry writes
/// [`WISHLIST_INTERACTION`] and a rating comment overwrites the cell with
/// the rating.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    user_ids: Vec<UserId>,
    project_ids: Vec<ProjectId>,
    user_index: HashMap<UserId, usize>,
    project_index: HashMap<ProjectId, usize>,
    cells: Vec<f64>,
    diagnostics: BuildDiagnostics,
}

impl InteractionMatrix {
    /// Build the matrix from raw store records
    pub fn build(users: &[UserRecord], projects: &[ProjectRecord]) -> Self {
        let mut diagnostics = BuildDiagnostics::default();

        let (user_ids, user_index) = index_ids(users.iter().map(|u| &u.id), &mut diagnostics);
        let (project_ids, project_index) =
            index_ids(projects.iter().map(|p| &p.id), &mut diagnostics);

        let mut matrix = Self {
            cells: vec![0.0; user_ids.len() * project_ids.len()],
            user_ids,
            project_ids,
            user_index,
            project_index,
            diagnostics,
        };

        // Wishlist presence first
        let mut seen = HashSet::new();
        for user in users {
            if !seen.insert(user.id.as_str()) {
                continue;
            }
            let Some(row) = matrix.user_position(&user.id) else {
                continue;
            };
            for item in &user.wishlist {
                match matrix.project_position(&item.project_id) {
                    Some(col) => matrix.set(row, col, WISHLIST_INTERACTION),
                    None => {
                        matrix.diagnostics.ignored_wishlist_refs += 1;
                        debug!(
                            user_id = %user.id,
                            project_id = %item.project_id,
                            "Ignoring wishlist entry for unknown project"
                        );
                    }
                }
            }
        }

        // Ratings take precedence over wishlist presence
        let mut seen = HashSet::new();
        for project in projects {
            if !seen.insert(project.id.as_str()) {
                continue;
            }
            let Some(col) = matrix.project_position(&project.id) else {
                continue;
            };
            for comment in &project.comments {
                match matrix.user_position(&comment.commented_by) {
                    Some(row) => matrix.set(row, col, comment.rating),
                    None => {
                        matrix.diagnostics.ignored_comment_refs += 1;
                        debug!(
                            project_id = %project.id,
                            commented_by = %comment.commented_by,
                            "Ignoring rating from unknown user"
                        );
                    }
                }
            }
        }

        if matrix.diagnostics.total_ignored() > 0 {
            warn!(
                ignored_wishlist_refs = matrix.diagnostics.ignored_wishlist_refs,
                ignored_comment_refs = matrix.diagnostics.ignored_comment_refs,
                duplicate_ids = matrix.diagnostics.duplicate_ids,
                "Interaction matrix built with dangling references"
            );
        }

        matrix
    }

    pub fn num_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn num_projects(&self) -> usize {
        self.project_ids.len()
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn project_ids(&self) -> &[ProjectId] {
        &self.project_ids
    }

    pub fn user_position(&self, user_id: &str) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    pub fn project_position(&self, project_id: &str) -> Option<usize> {
        self.project_index.get(project_id).copied()
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_index.contains_key(user_id)
    }

    /// Cell lookup by ids; `None` when either id is unknown
    pub fn get(&self, user_id: &str, project_id: &str) -> Option<f64> {
        let row = self.user_position(user_id)?;
        let col = self.project_position(project_id)?;
        Some(self.cells[row * self.num_projects() + col])
    }

    /// Interaction row of a user, one value per project column
    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.num_projects();
        &self.cells[row * width..(row + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.num_users()).map(move |row| self.row(row))
    }

    pub fn diagnostics(&self) -> BuildDiagnostics {
        self.diagnostics
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        let width = self.num_projects();
        self.cells[row * width + col] = value;
    }
}

/// Assign dense positions to ids, keeping the first occurrence of duplicates
fn index_ids<'a>(
    ids: impl Iterator<Item = &'a String>,
    diagnostics: &mut BuildDiagnostics,
) -> (Vec<String>, HashMap<String, usize>) {
    let mut ordered = Vec::new();
    let mut index = HashMap::new();
    for id in ids {
        if index.contains_key(id) {
            diagnostics.duplicate_ids += 1;
            continue;
        }
        index.insert(id.clone(), ordered.len());
        ordered.push(id.clone());
    }
    (ordered, index)
}
