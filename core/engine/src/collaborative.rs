// core/engine/src/collaborative.rs

use crate::interaction::InteractionMatrix;
use crate::math::{cosine_similarity, mean};
use crate::types::UserId;
use std::collections::HashMap;
use tracing::debug;

/// Symmetric user × user similarity table
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    user_ids: Vec<UserId>,
    index: HashMap<UserId, usize>,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Cosine similarity of mean-centred interaction rows
    pub fn compute(matrix: &InteractionMatrix) -> Self {
        let centred: Vec<Vec<f64>> = matrix.rows().map(mean_center).collect();
        let n = centred.len();
        let mut values = vec![0.0; n * n];

        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let sim = cosine_similarity(&centred[i], &centred[j]);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        let user_ids = matrix.user_ids().to_vec();
        let index = user_ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();

        debug!(users = n, "Computed user similarity matrix");
        Self {
            user_ids,
            index,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// Similarity between two users, `None` if either is unknown
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        Some(self.values[i * self.len() + j])
    }

    /// Similarity row of one user, positioned like `user_ids()`
    pub fn row(&self, user_id: &str) -> Option<&[f64]> {
        let i = *self.index.get(user_id)?;
        let n = self.len();
        Some(&self.values[i * n..(i + 1) * n])
    }

    /// Other users ordered by similarity to `user_id`, most similar first
    ///
    /// The user itself is excluded; equal similarities fall back to id order.
    pub fn neighbors(&self, user_id: &str) -> Vec<(UserId, f64)> {
        let Some(row) = self.row(user_id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<(UserId, f64)> = self
            .user_ids
            .iter()
            .zip(row.iter())
            .filter(|(id, _)| id.as_str() != user_id)
            .map(|(id, sim)| (id.clone(), *sim))
            .collect();
        neighbors.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        neighbors
    }
}

/// Subtract the row mean from every cell; an empty row stays empty
pub fn mean_center(row: &[f64]) -> Vec<f64> {
    let m = mean(row).unwrap_or(0.0);
    row.iter().map(|x| x - m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    const EPS: f64 = 1e-9;

    fn fixture() -> InteractionMatrix {
        let users = vec![
            UserRecord::new("alice").with_wish("p1").with_wish("p2"),
            UserRecord::new("bob").with_wish("p1"),
            UserRecord::new("carol").with_wish("p3"),
            UserRecord::new("dave"),
        ];
        let projects = vec![
            ProjectRecord::new("p1", "One", "").with_rating("bob", 5.0),
            ProjectRecord::new("p2", "Two", "").with_rating("carol", 2.0),
            ProjectRecord::new("p3", "Three", "").with_rating("alice", 1.0),
        ];
        InteractionMatrix::build(&users, &projects)
    }

    #[test]
    fn test_similarity_is_symmetric_with_unit_diagonal() {
        let sim = SimilarityMatrix::compute(&fixture());
        let ids = sim.user_ids().to_vec();
        for a in &ids {
            assert_eq!(sim.get(a, a), Some(1.0));
            for b in &ids {
                let ab = sim.get(a, b).unwrap();
                let ba = sim.get(b, a).unwrap();
                assert!((ab - ba).abs() < EPS);
                assert!((-1.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn test_zero_row_user_has_no_similarity() {
        let sim = SimilarityMatrix::compute(&fixture());
        // dave has no interactions, so his centred row is all zeros
        assert_eq!(sim.get("dave", "alice"), Some(0.0));
        assert_eq!(sim.get("dave", "dave"), Some(1.0));
    }

    #[test]
    fn test_mean_center_has_zero_mean() {
        let matrix = fixture();
        for row in matrix.rows() {
            let centred = mean_center(row);
            if row.iter().any(|v| *v != 0.0) {
                let m = centred.iter().sum::<f64>() / centred.len() as f64;
                assert!(m.abs() < EPS);
            }
        }
        assert!(mean_center(&[]).is_empty());
    }

    #[test]
    fn test_neighbors_exclude_self_and_sort_descending() {
        let sim = SimilarityMatrix::compute(&fixture());
        let neighbors = sim.neighbors("alice");
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.iter().all(|(id, _)| id != "alice"));
        for pair in neighbors.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        assert!(sim.neighbors("nobody").is_empty());
    }

    #[test]
    fn test_identical_preferences_are_fully_similar() {
        let users = vec![
            UserRecord::new("u1").with_wish("a"),
            UserRecord::new("u2").with_wish("a"),
        ];
        let projects = vec![
            ProjectRecord::new("a", "A", ""),
            ProjectRecord::new("b", "B", ""),
        ];
        let sim = SimilarityMatrix::compute(&InteractionMatrix::build(&users, &projects));
        assert!((sim.get("u1", "u2").unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_empty_matrix() {
        let sim = SimilarityMatrix::compute(&InteractionMatrix::build(&[], &[]));
        assert!(sim.is_empty());
        assert_eq!(sim.get("x", "x"), None);
    }
}
