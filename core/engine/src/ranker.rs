// core/engine/src/ranker.rs

use crate::collaborative::SimilarityMatrix;
use crate::content::{TfidfMatrix, TfidfModel, UserContentProfile};
use crate::error::{EngineError, Result};
use crate::interaction::InteractionMatrix;
use crate::math::z_normalize;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_TOP_N: usize = 8;
pub const DEFAULT_ALPHA: f64 = 0.7;

/// Ranking parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Number of titles returned
    pub top_n: usize,
    /// Weight of the collaborative signal; content gets `1 - alpha`
    pub alpha: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl RankerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(EngineError::InvalidConfig("top_n must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(EngineError::InvalidConfig(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Everything the ranker reads for one request
pub struct RankingInputs<'a> {
    pub matrix: &'a InteractionMatrix,
    pub user_similarity: &'a SimilarityMatrix,
    pub projects: &'a [ProjectRecord],
    pub users: &'a [UserRecord],
    pub tfidf_matrix: &'a TfidfMatrix,
    pub model: &'a TfidfModel,
}

/// Blends collaborative and content scores into a top-N list
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridRanker {
    config: RankerConfig,
}

impl HybridRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> RankerConfig {
        self.config
    }

    /// Scored candidates for `user_id`, best first, at most `top_n`
    ///
    /// An unknown user yields an empty list. A matrix column without a
    /// tf-idf row fails with [`EngineError::UnknownProject`].
    pub fn rank(&self, user_id: &str, inputs: &RankingInputs<'_>) -> Result<Vec<ScoredProject>> {
        let matrix = inputs.matrix;
        let Some(user_row) = matrix.user_position(user_id) else {
            debug!(user_id = %user_id, "Unknown user, nothing to rank");
            return Ok(Vec::new());
        };
        let Some(user) = inputs.users.iter().find(|u| u.id == user_id) else {
            return Ok(Vec::new());
        };

        let collaborative = collaborative_scores(user_id, matrix, inputs.user_similarity);
        let content = self.content_scores(user, inputs)?;

        let mut titles: HashMap<&str, &str> = HashMap::with_capacity(inputs.projects.len());
        for project in inputs.projects {
            titles
                .entry(project.id.as_str())
                .or_insert(project.title.as_str());
        }

        let cf = z_normalize(&collaborative);
        let cb = z_normalize(&content);
        let alpha = self.config.alpha;
        let interactions = matrix.row(user_row);

        let mut candidates: Vec<ScoredProject> = Vec::new();
        for (col, project_id) in matrix.project_ids().iter().enumerate() {
            if interactions[col] != 0.0 {
                continue;
            }
            let Some(title) = titles.get(project_id.as_str()) else {
                continue;
            };
            candidates.push(ScoredProject {
                project_id: project_id.clone(),
                title: title.to_string(),
                collaborative_score: cf[col],
                content_score: cb[col],
                hybrid_score: alpha * cf[col] + (1.0 - alpha) * cb[col],
            });
        }

        candidates.sort_by(|a, b| {
            b.hybrid_score
                .partial_cmp(&a.hybrid_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.project_id.cmp(&b.project_id))
        });
        candidates.truncate(self.config.top_n);

        debug!(
            user_id = %user_id,
            candidates = candidates.len(),
            "Ranked hybrid candidates"
        );
        Ok(candidates)
    }

    /// Titles of the top candidates, best first
    pub fn recommend(&self, user_id: &str, inputs: &RankingInputs<'_>) -> Result<Vec<String>> {
        Ok(self
            .rank(user_id, inputs)?
            .into_iter()
            .map(|scored| scored.title)
            .collect())
    }

    /// Content score for every matrix column
    fn content_scores(&self, user: &UserRecord, inputs: &RankingInputs<'_>) -> Result<Vec<f64>> {
        let profile = UserContentProfile::new(user, inputs.projects, inputs.model);
        inputs
            .matrix
            .project_ids()
            .iter()
            .map(|project_id| profile.score_project(project_id, inputs.tfidf_matrix))
            .collect()
    }
}

/// Similarity-weighted vote of every other user, one score per project column
pub fn collaborative_scores(
    user_id: &str,
    matrix: &InteractionMatrix,
    user_similarity: &SimilarityMatrix,
) -> Vec<f64> {
    let mut scores = vec![0.0; matrix.num_projects()];
    for (other, similarity) in user_similarity.neighbors(user_id) {
        let Some(row) = matrix.user_position(&other) else {
            continue;
        };
        for (score, value) in scores.iter_mut().zip(matrix.row(row)) {
            *score += similarity * value;
        }
    }
    scores
}
