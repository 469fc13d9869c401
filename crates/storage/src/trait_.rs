//! Storage trait abstraction.

use async_trait::async_trait;
use traverse_core::{
    AchievementStatus, ModuleId, ModuleReview, ProgressSnapshot, QuizAttempt,
    ResourceCompletion, ResourceId, ResourceSubmission, SubmissionId, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for learner progress records.
///
/// This trait allows different persistence backends to be plugged in. The
/// engine treats the backend as the single source of truth; every derived
/// view is recomputed from what these methods return.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Resource completions ===

    /// Save a completion record (create or update).
    async fn save_completion(&mut self, completion: &ResourceCompletion) -> Result<()>;

    /// Load the completion record for one (learner, resource) pair.
    async fn load_completion(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Option<ResourceCompletion>>;

    /// List all completion records of a learner.
    async fn list_completions(&self, user_id: UserId) -> Result<Vec<ResourceCompletion>>;

    // === Submissions ===

    /// Save a submission record (create or update).
    async fn save_submission(&mut self, submission: &ResourceSubmission) -> Result<()>;

    /// Load a submission by id.
    async fn load_submission(&self, id: SubmissionId) -> Result<Option<ResourceSubmission>>;

    /// List a learner's submissions against one resource, newest first.
    async fn list_submissions(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<ResourceSubmission>>;

    // === Module reviews ===

    /// Save a module review record (create or update).
    async fn save_review(&mut self, review: &ModuleReview) -> Result<()>;

    /// Load the review record for one (learner, module) pair.
    async fn load_review(
        &self,
        user_id: UserId,
        module_id: &ModuleId,
    ) -> Result<Option<ModuleReview>>;

    /// List all review records of a learner.
    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<ModuleReview>>;

    // === Quiz attempts ===

    /// Append a quiz attempt. Attempts are never updated or deleted.
    async fn save_attempt(&mut self, attempt: &QuizAttempt) -> Result<()>;

    /// List a learner's attempts against one quiz resource, oldest first.
    async fn list_attempts(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<QuizAttempt>>;

    /// List all of a learner's quiz attempts.
    async fn list_all_attempts(&self, user_id: UserId) -> Result<Vec<QuizAttempt>>;

    // === Achievement unlock state ===

    /// Save a per-learner achievement status (create or update).
    async fn save_achievement_status(&mut self, status: &AchievementStatus) -> Result<()>;

    /// List a learner's achievement statuses.
    async fn list_achievement_statuses(&self, user_id: UserId) -> Result<Vec<AchievementStatus>>;

    // === Snapshot cache ===

    /// Overwrite the cached snapshot for a learner.
    async fn save_snapshot(&mut self, snapshot: &ProgressSnapshot) -> Result<()>;

    /// Load the cached snapshot for a learner, if one exists.
    async fn load_snapshot(&self, user_id: UserId) -> Result<Option<ProgressSnapshot>>;
}

/// Sort submissions newest-first: creation time descending, id as tiebreak.
pub fn sort_newest_first(submissions: &mut [ResourceSubmission]) {
    submissions.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.to_string().cmp(&a.id.to_string()))
    });
}

/// Shared handle to one backend.
///
/// Several services can each own a clone of the same `Arc<Mutex<S>>` and
/// observe each other's writes, which is how the trackers, the gate and the
/// aggregator cooperate within one process.
#[async_trait]
impl<S: Storage> Storage for std::sync::Arc<tokio::sync::Mutex<S>> {
    async fn save_completion(&mut self, completion: &ResourceCompletion) -> Result<()> {
        self.lock().await.save_completion(completion).await
    }

    async fn load_completion(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Option<ResourceCompletion>> {
        self.lock().await.load_completion(user_id, resource_id).await
    }

    async fn list_completions(&self, user_id: UserId) -> Result<Vec<ResourceCompletion>> {
        self.lock().await.list_completions(user_id).await
    }

    async fn save_submission(&mut self, submission: &ResourceSubmission) -> Result<()> {
        self.lock().await.save_submission(submission).await
    }

    async fn load_submission(&self, id: SubmissionId) -> Result<Option<ResourceSubmission>> {
        self.lock().await.load_submission(id).await
    }

    async fn list_submissions(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<ResourceSubmission>> {
        self.lock().await.list_submissions(user_id, resource_id).await
    }

    async fn save_review(&mut self, review: &ModuleReview) -> Result<()> {
        self.lock().await.save_review(review).await
    }

    async fn load_review(
        &self,
        user_id: UserId,
        module_id: &ModuleId,
    ) -> Result<Option<ModuleReview>> {
        self.lock().await.load_review(user_id, module_id).await
    }

    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<ModuleReview>> {
        self.lock().await.list_reviews(user_id).await
    }

    async fn save_attempt(&mut self, attempt: &QuizAttempt) -> Result<()> {
        self.lock().await.save_attempt(attempt).await
    }

    async fn list_attempts(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<QuizAttempt>> {
        self.lock().await.list_attempts(user_id, resource_id).await
    }

    async fn list_all_attempts(&self, user_id: UserId) -> Result<Vec<QuizAttempt>> {
        self.lock().await.list_all_attempts(user_id).await
    }

    async fn save_achievement_status(&mut self, status: &AchievementStatus) -> Result<()> {
        self.lock().await.save_achievement_status(status).await
    }

    async fn list_achievement_statuses(&self, user_id: UserId) -> Result<Vec<AchievementStatus>> {
        self.lock().await.list_achievement_statuses(user_id).await
    }

    async fn save_snapshot(&mut self, snapshot: &ProgressSnapshot) -> Result<()> {
        self.lock().await.save_snapshot(snapshot).await
    }

    async fn load_snapshot(&self, user_id: UserId) -> Result<Option<ProgressSnapshot>> {
        self.lock().await.load_snapshot(user_id).await
    }
}
