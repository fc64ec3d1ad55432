// core/engine/src/lib.rs

//! Projrec hybrid recommendation engine
//!
//! Builds a user × project interaction matrix from store records, derives
//! user-user similarity from mean-centred interaction rows and project
//! affinity from tf-idf vectors of descriptions, then blends both signals
//! into a ranked list of project titles.

pub mod collaborative;
pub mod content;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod math;
pub mod ranker;
pub mod store;
pub mod types;

pub use types::*;

// Re-export key types for easy access
pub use crate::{
    collaborative::SimilarityMatrix,
    content::{build_tfidf, content_score, Lowercase, TextNormalizer, TfidfMatrix, TfidfModel},
    engine::{recommend_from_snapshot, RecommendationEngine},
    error::{EngineError, StoreError},
    interaction::InteractionMatrix,
    ranker::{HybridRanker, RankerConfig, RankingInputs, DEFAULT_ALPHA, DEFAULT_TOP_N},
    store::{DataSource, InMemoryStore, JsonFileStore},
};
