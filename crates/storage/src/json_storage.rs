//! JSON file storage implementation.
//!
//! Stores each record as one JSON document under a `.traverse` directory,
//! keyed per learner. Submissions and attempts are append-heavy, so they are
//! stored one file per record; completions and reviews are keyed by the
//! content slug they track.

use std::path::{Path, PathBuf};
use traverse_core::{
    AchievementStatus, ModuleId, ModuleReview, ProgressSnapshot, QuizAttempt,
    ResourceCompletion, ResourceId, ResourceSubmission, SubmissionId, UserId,
};
use super::{sort_newest_first, Result, Storage};
use tokio::fs;

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at the given directory, creating the record
    /// subdirectories as needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("completions")).await?;
        fs::create_dir_all(root.join("submissions")).await?;
        fs::create_dir_all(root.join("reviews")).await?;
        fs::create_dir_all(root.join("attempts")).await?;
        fs::create_dir_all(root.join("achievements")).await?;
        fs::create_dir_all(root.join("snapshots")).await?;

        Ok(Self { root })
    }

    fn completion_path(&self, user_id: UserId, resource_id: &ResourceId) -> PathBuf {
        self.root
            .join("completions")
            .join(user_id.to_string())
            .join(format!("{}.json", resource_id))
    }

    fn submission_dir(&self, user_id: UserId) -> PathBuf {
        self.root.join("submissions").join(user_id.to_string())
    }

    fn submission_path(&self, user_id: UserId, id: SubmissionId) -> PathBuf {
        self.submission_dir(user_id).join(format!("{}.json", id))
    }

    fn review_path(&self, user_id: UserId, module_id: &ModuleId) -> PathBuf {
        self.root
            .join("reviews")
            .join(user_id.to_string())
            .join(format!("{}.json", module_id))
    }

    fn attempt_dir(&self, user_id: UserId) -> PathBuf {
        self.root.join("attempts").join(user_id.to_string())
    }

    fn achievement_path(&self, user_id: UserId, achievement_id: &str) -> PathBuf {
        self.root
            .join("achievements")
            .join(user_id.to_string())
            .join(format!("{}.json", achievement_id))
    }

    fn snapshot_path(&self, user_id: UserId) -> PathBuf {
        self.root.join("snapshots").join(format!("{}.json", user_id))
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_completion(&mut self, completion: &ResourceCompletion) -> Result<()> {
        let path = self.completion_path(completion.user_id, &completion.resource_id);
        self.write_json(&path, completion).await
    }

    async fn load_completion(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Option<ResourceCompletion>> {
        read_json(&self.completion_path(user_id, resource_id)).await
    }

    async fn list_completions(&self, user_id: UserId) -> Result<Vec<ResourceCompletion>> {
        list_dir(&self.root.join("completions").join(user_id.to_string())).await
    }

    async fn save_submission(&mut self, submission: &ResourceSubmission) -> Result<()> {
        let path = self.submission_path(submission.user_id, submission.id);
        self.write_json(&path, submission).await
    }

    async fn load_submission(&self, id: SubmissionId) -> Result<Option<ResourceSubmission>> {
        // Submissions are stored per learner; scan the per-user directories.
        let mut rd = fs::read_dir(self.root.join("submissions")).await?;
        while let Some(entry) = rd.next_entry().await? {
            let candidate = entry.path().join(format!("{}.json", id));
            if let Some(found) = read_json(&candidate).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    async fn list_submissions(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<ResourceSubmission>> {
        let all: Vec<ResourceSubmission> = list_dir(&self.submission_dir(user_id)).await?;
        let mut matching: Vec<_> = all
            .into_iter()
            .filter(|s| &s.resource_id == resource_id)
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }

    async fn save_review(&mut self, review: &ModuleReview) -> Result<()> {
        let path = self.review_path(review.user_id, &review.module_id);
        self.write_json(&path, review).await
    }

    async fn load_review(
        &self,
        user_id: UserId,
        module_id: &ModuleId,
    ) -> Result<Option<ModuleReview>> {
        read_json(&self.review_path(user_id, module_id)).await
    }

    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<ModuleReview>> {
        list_dir(&self.root.join("reviews").join(user_id.to_string())).await
    }

    async fn save_attempt(&mut self, attempt: &QuizAttempt) -> Result<()> {
        let path = self
            .attempt_dir(attempt.user_id)
            .join(format!("{}.json", attempt.id));
        self.write_json(&path, attempt).await
    }

    async fn list_attempts(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<QuizAttempt>> {
        let mut attempts: Vec<QuizAttempt> = self
            .list_all_attempts(user_id)
            .await?
            .into_iter()
            .filter(|a| &a.resource_id == resource_id)
            .collect();
        attempts.sort_by(|a, b| a.attempted_at.cmp(&b.attempted_at));
        Ok(attempts)
    }

    async fn list_all_attempts(&self, user_id: UserId) -> Result<Vec<QuizAttempt>> {
        list_dir(&self.attempt_dir(user_id)).await
    }

    async fn save_achievement_status(&mut self, status: &AchievementStatus) -> Result<()> {
        let path = self.achievement_path(status.user_id, &status.achievement_id);
        self.write_json(&path, status).await
    }

    async fn list_achievement_statuses(&self, user_id: UserId) -> Result<Vec<AchievementStatus>> {
        list_dir(&self.root.join("achievements").join(user_id.to_string())).await
    }

    async fn save_snapshot(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        let path = self.snapshot_path(snapshot.user_id);
        self.write_json(&path, snapshot).await
    }

    async fn load_snapshot(&self, user_id: UserId) -> Result<Option<ProgressSnapshot>> {
        read_json(&self.snapshot_path(user_id)).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        // A learner with no records has no directory yet.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Ok(Some(item)) = read_json(&entry.path()).await {
            items.push(item);
        }
    }
    Ok(items)
}
