//! In-memory storage backend.
//!
//! Backs unit tests and embedded usage where persistence across restarts is
//! not needed. Keys mirror the JSON backend's layout.

use std::collections::HashMap;
use traverse_core::{
    AchievementStatus, ModuleId, ModuleReview, ProgressSnapshot, QuizAttempt,
    ResourceCompletion, ResourceId, ResourceSubmission, SubmissionId, UserId,
};
use super::{sort_newest_first, Result, Storage};

/// Storage backend holding everything in process memory.
#[derive(Default)]
pub struct MemoryStorage {
    completions: HashMap<(UserId, ResourceId), ResourceCompletion>,
    submissions: HashMap<SubmissionId, ResourceSubmission>,
    reviews: HashMap<(UserId, ModuleId), ModuleReview>,
    attempts: Vec<QuizAttempt>,
    achievement_statuses: HashMap<(UserId, String), AchievementStatus>,
    snapshots: HashMap<UserId, ProgressSnapshot>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_completion(&mut self, completion: &ResourceCompletion) -> Result<()> {
        self.completions.insert(
            (completion.user_id, completion.resource_id.clone()),
            completion.clone(),
        );
        Ok(())
    }

    async fn load_completion(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Option<ResourceCompletion>> {
        Ok(self
            .completions
            .get(&(user_id, resource_id.clone()))
            .cloned())
    }

    async fn list_completions(&self, user_id: UserId) -> Result<Vec<ResourceCompletion>> {
        Ok(self
            .completions
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_submission(&mut self, submission: &ResourceSubmission) -> Result<()> {
        self.submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn load_submission(&self, id: SubmissionId) -> Result<Option<ResourceSubmission>> {
        Ok(self.submissions.get(&id).cloned())
    }

    async fn list_submissions(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<ResourceSubmission>> {
        let mut matching: Vec<_> = self
            .submissions
            .values()
            .filter(|s| s.user_id == user_id && &s.resource_id == resource_id)
            .cloned()
            .collect();
        sort_newest_first(&mut matching);
        Ok(matching)
    }

    async fn save_review(&mut self, review: &ModuleReview) -> Result<()> {
        self.reviews
            .insert((review.user_id, review.module_id.clone()), review.clone());
        Ok(())
    }

    async fn load_review(
        &self,
        user_id: UserId,
        module_id: &ModuleId,
    ) -> Result<Option<ModuleReview>> {
        Ok(self.reviews.get(&(user_id, module_id.clone())).cloned())
    }

    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<ModuleReview>> {
        Ok(self
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_attempt(&mut self, attempt: &QuizAttempt) -> Result<()> {
        self.attempts.push(attempt.clone());
        Ok(())
    }

    async fn list_attempts(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<QuizAttempt>> {
        let mut attempts: Vec<_> = self
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id && &a.resource_id == resource_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| a.attempted_at.cmp(&b.attempted_at));
        Ok(attempts)
    }

    async fn list_all_attempts(&self, user_id: UserId) -> Result<Vec<QuizAttempt>> {
        Ok(self
            .attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_achievement_status(&mut self, status: &AchievementStatus) -> Result<()> {
        self.achievement_statuses.insert(
            (status.user_id, status.achievement_id.clone()),
            status.clone(),
        );
        Ok(())
    }

    async fn list_achievement_statuses(&self, user_id: UserId) -> Result<Vec<AchievementStatus>> {
        Ok(self
            .achievement_statuses
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_snapshot(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.snapshots.insert(snapshot.user_id, snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self, user_id: UserId) -> Result<Option<ProgressSnapshot>> {
        Ok(self.snapshots.get(&user_id).cloned())
    }
}
