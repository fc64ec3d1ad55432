// core/engine/src/engine.rs

use crate::collaborative::SimilarityMatrix;
use crate::content::{build_tfidf, Lowercase, TextNormalizer};
use crate::error::Result;
use crate::interaction::InteractionMatrix;
use crate::ranker::{HybridRanker, RankerConfig, RankingInputs};
use crate::store::DataSource;
use crate::types::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Runs the full fetch → matrix → similarity → rank pipeline per request
///
/// Holds no per-request state, so one instance can serve concurrent callers.
pub struct RecommendationEngine {
    source: Arc<dyn DataSource>,
    config: RankerConfig,
    normalizer: Arc<dyn TextNormalizer>,
}

impl RecommendationEngine {
    /// Create an engine over an injected data source
    pub fn new(source: Arc<dyn DataSource>, config: RankerConfig) -> Result<Self> {
        config.validate()?;
        info!(
            source = source.name(),
            top_n = config.top_n,
            alpha = config.alpha,
            "Recommendation engine initialized"
        );
        Ok(Self {
            source,
            config,
            normalizer: Arc::new(Lowercase),
        })
    }

    /// Replace the description normalizer (lowercase by default)
    pub fn with_normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> RankerConfig {
        self.config
    }

    /// Recommendations using the configured ranking parameters
    pub async fn get_recommendations(&self, user_id: &str) -> Result<RecommendationResult> {
        self.get_recommendations_with(user_id, self.config).await
    }

    /// Recommendations with per-call ranking parameters
    pub async fn get_recommendations_with(
        &self,
        user_id: &str,
        config: RankerConfig,
    ) -> Result<RecommendationResult> {
        config.validate()?;
        let started = Instant::now();

        let snapshot = self.source.fetch().await.map_err(|e| {
            error!(source = self.source.name(), "Failed to fetch data: {}", e);
            e
        })?;

        let result = recommend_from_snapshot(&snapshot, user_id, config, self.normalizer.clone())?;

        info!(
            user_id = %user_id,
            users = snapshot.users.len(),
            projects = snapshot.projects.len(),
            recommendations = result.recommendations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated recommendations"
        );
        Ok(result)
    }
}

/// Pure pipeline over an already fetched snapshot
pub fn recommend_from_snapshot(
    snapshot: &Snapshot,
    user_id: &str,
    config: RankerConfig,
    normalizer: Arc<dyn TextNormalizer>,
) -> Result<RecommendationResult> {
    let matrix = InteractionMatrix::build(&snapshot.users, &snapshot.projects);
    let user_similarity = SimilarityMatrix::compute(&matrix);
    let (tfidf_matrix, model) = build_tfidf(&snapshot.projects, normalizer);

    debug!(
        users = matrix.num_users(),
        projects = matrix.num_projects(),
        vocabulary = model.vocabulary_size(),
        "Models prepared"
    );

    let inputs = RankingInputs {
        matrix: &matrix,
        user_similarity: &user_similarity,
        projects: &snapshot.projects,
        users: &snapshot.users,
        tfidf_matrix: &tfidf_matrix,
        model: &model,
    };
    let recommendations = HybridRanker::new(config).recommend(user_id, &inputs)?;

    Ok(RecommendationResult {
        user_id: user_id.to_string(),
        recommendations,
        diagnostics: matrix.diagnostics(),
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, StoreError};
    use crate::store::InMemoryStore;
    use async_trait::async_trait;

    struct FailingSource;

    #[async_trait]
    impl DataSource for FailingSource {
        async fn fetch(&self) -> std::result::Result<Snapshot, StoreError> {
            Err(StoreError::Unreachable("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn seeded_store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store.put_user(UserRecord::new("U1").with_wish("P1"));
        store.put_user(UserRecord::new("U2").with_wish("P1"));
        store.put_project(ProjectRecord::new("P1", "A", "community garden"));
        store.put_project(ProjectRecord::new("P2", "B", "community kitchen").with_rating("U2", 5.0));
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_engine_excludes_interacted_projects() {
        let engine = RecommendationEngine::new(seeded_store(), RankerConfig::default()).unwrap();
        let result = engine.get_recommendations("U1").await.unwrap();
        assert!(!result.recommendations.contains(&"A".to_string()));
        assert_eq!(result.user_id, "U1");
    }

    #[tokio::test]
    async fn test_engine_unknown_user_is_empty_not_error() {
        let engine = RecommendationEngine::new(seeded_store(), RankerConfig::default()).unwrap();
        let result = engine.get_recommendations("stranger").await.unwrap();
        assert!(result.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_engine_propagates_store_failure() {
        let engine = RecommendationEngine::new(Arc::new(FailingSource), RankerConfig::default()).unwrap();
        let err = engine.get_recommendations("U1").await.unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::Unreachable(_))));
        assert_eq!(err.kind(), "store");
    }

    #[tokio::test]
    async fn test_engine_rejects_invalid_config() {
        let bad = RankerConfig { top_n: 8, alpha: -0.1 };
        assert!(RecommendationEngine::new(seeded_store(), bad).is_err());

        let engine = RecommendationEngine::new(seeded_store(), RankerConfig::default()).unwrap();
        let err = engine
            .get_recommendations_with("U1", RankerConfig { top_n: 0, alpha: 0.7 })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_snapshot_pipeline_reports_diagnostics() {
        let snapshot = Snapshot {
            users: vec![UserRecord::new("U1").with_wish("ghost")],
            projects: vec![ProjectRecord::new("P1", "A", "text").with_rating("nobody", 2.0)],
        };
        let result = recommend_from_snapshot(&snapshot, "U1", RankerConfig::default(), Arc::new(Lowercase)).unwrap();
        assert_eq!(result.recommendations, vec!["A".to_string()]);
        assert_eq!(result.diagnostics.ignored_wishlist_refs, 1);
        assert_eq!(result.diagnostics.ignored_comment_refs, 1);
    }
}
