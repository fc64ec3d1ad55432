// core/engine/src/store.rs

use crate::error::StoreError;
use crate::types::*;
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only access to the user/project document store
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch every user (wishlists resolved) and every project (comments resolved)
    async fn fetch(&self) -> Result<Snapshot, StoreError>;

    /// Human readable name for logs
    fn name(&self) -> &'static str;
}

/// Entry tagged with its insertion sequence so fetches keep a stable order
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    record: T,
}

/// Simple in-memory store
pub struct InMemoryStore {
    users: Arc<DashMap<UserId, Sequenced<UserRecord>>>,
    projects: Arc<DashMap<ProjectId, Sequenced<ProjectRecord>>>,
    next_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            projects: Arc::new(DashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Create a store pre-populated from a snapshot
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        for user in snapshot.users {
            store.put_user(user);
        }
        for project in snapshot.projects {
            store.put_project(project);
        }
        info!(
            users = store.users.len(),
            projects = store.projects.len(),
            "In-memory store seeded"
        );
        store
    }

    /// Insert or replace a user; replacing keeps the original position
    pub fn put_user(&self, user: UserRecord) {
        let seq = self
            .users
            .get(&user.id)
            .map(|entry| entry.seq)
            .unwrap_or_else(|| self.next_seq.fetch_add(1, Ordering::SeqCst));
        debug!(user_id = %user.id, "User stored");
        self.users.insert(user.id.clone(), Sequenced { seq, record: user });
    }

    /// Insert or replace a project; replacing keeps the original position
    pub fn put_project(&self, project: ProjectRecord) {
        let seq = self
            .projects
            .get(&project.id)
            .map(|entry| entry.seq)
            .unwrap_or_else(|| self.next_seq.fetch_add(1, Ordering::SeqCst));
        debug!(project_id = %project.id, "Project stored");
        self.projects
            .insert(project.id.clone(), Sequenced { seq, record: project });
    }

    pub fn remove_user(&self, user_id: &str) -> Option<UserRecord> {
        self.users.remove(user_id).map(|(_, entry)| entry.record)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        self.users.clear();
        self.projects.clear();
        info!("Store cleared");
    }

    fn ordered<T: Clone>(map: &DashMap<String, Sequenced<T>>) -> Vec<T> {
        let mut entries: Vec<Sequenced<T>> = map.iter().map(|entry| entry.value().clone()).collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.record).collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for InMemoryStore {
    async fn fetch(&self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            users: Self::ordered(&self.users),
            projects: Self::ordered(&self.projects),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Store backed by a JSON snapshot file, re-read on every fetch
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn validate(snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(pos) = snapshot.users.iter().position(|u| u.id.is_empty()) {
            return Err(StoreError::Malformed(format!("user #{} has an empty id", pos)));
        }
        if let Some(pos) = snapshot.projects.iter().position(|p| p.id.is_empty()) {
            return Err(StoreError::Malformed(format!("project #{} has an empty id", pos)));
        }
        for project in &snapshot.projects {
            if let Some(comment) = project.comments.iter().find(|c| !c.rating.is_finite()) {
                return Err(StoreError::Malformed(format!(
                    "project {} has a non-finite rating from {}",
                    project.id, comment.commented_by
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for JsonFileStore {
    async fn fetch(&self) -> Result<Snapshot, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Unreachable(format!(
                    "snapshot file {} does not exist",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_slice(&raw)?;
        Self::validate(&snapshot)?;

        debug!(
            path = %self.path.display(),
            users = snapshot.users.len(),
            projects = snapshot.projects.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_memory_store_keeps_insertion_order() {
        let store = InMemoryStore::new();
        store.put_user(UserRecord::new("u2"));
        store.put_user(UserRecord::new("u1"));
        store.put_project(ProjectRecord::new("p9", "Nine", "nine"));
        store.put_project(ProjectRecord::new("p1", "One", "one"));

        // Replacing keeps the slot
        store.put_user(UserRecord::new("u2").with_wish("p1"));

        let snapshot = store.fetch().await.unwrap();
        let user_ids: Vec<_> = snapshot.users.iter().map(|u| u.id.as_str()).collect();
        let project_ids: Vec<_> = snapshot.projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(user_ids, vec!["u2", "u1"]);
        assert_eq!(project_ids, vec!["p9", "p1"]);
        assert!(snapshot.users[0].wishes("p1"));
    }

    #[tokio::test]
    async fn test_memory_store_remove_and_clear() {
        let store = InMemoryStore::new();
        store.put_user(UserRecord::new("u1"));
        store.put_project(ProjectRecord::new("p1", "One", "one"));

        assert!(store.remove_user("u1").is_some());
        assert!(store.remove_user("u1").is_none());
        assert_eq!(store.user_count(), 0);

        store.clear();
        assert_eq!(store.project_count(), 0);
        let snapshot = store.fetch().await.unwrap();
        assert!(snapshot.projects.is_empty());
    }

    #[tokio::test]
    async fn test_json_store_reads_camel_case_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "users": [{{"id": "u1", "wishlist": [{{"projectId": "p1"}}]}}],
                "projects": [{{"id": "p1", "title": "A", "description": "rust tools",
                              "comments": [{{"commentedBy": "u1", "rating": 4}}]}}]
            }}"#
        )
        .unwrap();

        let store = JsonFileStore::new(file.path());
        let snapshot = store.fetch().await.unwrap();
        assert_eq!(snapshot.users[0].wishlist[0].project_id, "p1");
        assert_eq!(snapshot.projects[0].comments[0].commented_by, "u1");
        assert_eq!(snapshot.projects[0].comments[0].rating, 4.0);
    }

    #[tokio::test]
    async fn test_json_store_missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        let err = store.fetch().await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_json_store_rejects_bad_payloads() {
        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        write!(garbage, "{{ not json").unwrap();
        let err = JsonFileStore::new(garbage.path()).fetch().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));

        let mut empty_id = tempfile::NamedTempFile::new().unwrap();
        write!(empty_id, r#"{{"users": [{{"id": ""}}], "projects": []}}"#).unwrap();
        let err = JsonFileStore::new(empty_id.path()).fetch().await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }
}
