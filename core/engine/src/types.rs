// core/engine/src/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user identifier as issued by the document store
pub type UserId = String;

/// Opaque project identifier as issued by the document store
pub type ProjectId = String;

/// A single wishlist entry referencing a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub project_id: ProjectId,
}

/// User record with its resolved wishlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub wishlist: Vec<WishlistItem>,
}

impl UserRecord {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            wishlist: Vec::new(),
        }
    }

    /// Append a wishlist entry (builder style, used by seeds and tests)
    pub fn with_wish(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.wishlist.push(WishlistItem {
            project_id: project_id.into(),
        });
        self
    }

    pub fn wishes(&self, project_id: &str) -> bool {
        self.wishlist.iter().any(|item| item.project_id == project_id)
    }
}

/// Rating comment left on a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingComment {
    pub commented_by: UserId,
    pub rating: f64,
}

/// Project record with its resolved comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub comments: Vec<RatingComment>,
}

impl ProjectRecord {
    pub fn new(id: impl Into<ProjectId>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            comments: Vec::new(),
        }
    }

    /// Append a rating comment (builder style, used by seeds and tests)
    pub fn with_rating(mut self, commented_by: impl Into<UserId>, rating: f64) -> Self {
        self.comments.push(RatingComment {
            commented_by: commented_by.into(),
            rating,
        });
        self
    }
}

/// Point-in-time view of the store, as returned by a single fetch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

/// Counters for references the matrix builder skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDiagnostics {
    /// Wishlist entries pointing at a project outside the project set
    pub ignored_wishlist_refs: usize,
    /// Rating comments written by a user outside the user set
    pub ignored_comment_refs: usize,
    /// Records dropped because their id was already seen
    pub duplicate_ids: usize,
}

impl BuildDiagnostics {
    pub fn total_ignored(&self) -> usize {
        self.ignored_wishlist_refs + self.ignored_comment_refs + self.duplicate_ids
    }
}

/// A ranked candidate produced by the hybrid ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProject {
    pub project_id: ProjectId,
    pub title: String,
    pub collaborative_score: f64,
    pub content_score: f64,
    pub hybrid_score: f64,
}

/// Outcome of one recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub user_id: UserId,
    /// Project titles, best first
    pub recommendations: Vec<String>,
    pub diagnostics: BuildDiagnostics,
    pub generated_at: DateTime<Utc>,
}
