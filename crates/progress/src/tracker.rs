//! Resource completion tracking service.

use std::sync::Arc;
use traverse_content::ContentLibrary;
use traverse_core::{
    CompletionStatus, QuizAttempt, Resource, ResourceCompletion, ResourceId, ResourceKind, UserId,
};
use traverse_storage::Storage;

use crate::{ProgressError, Result};

/// Owns the lifecycle of (learner, resource) completion records.
///
/// Records move forward only: `in_progress` to `completed` to `submitted`
/// to `reviewed`. The single sanctioned regression is [`ResourceTracker::uncomplete`]
/// on video and article resources.
pub struct ResourceTracker<S: Storage> {
    storage: S,
    library: Arc<ContentLibrary>,
}

impl<S: Storage> ResourceTracker<S> {
    /// Create a tracker over a storage backend and content tables.
    pub fn new(storage: S, library: Arc<ContentLibrary>) -> Self {
        Self { storage, library }
    }

    /// Access the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn resource(&self, resource_id: &ResourceId) -> Result<&Resource> {
        self.library
            .find_resource(resource_id)
            .map(|ctx| ctx.resource)
            .ok_or_else(|| ProgressError::UnknownResource(resource_id.clone()))
    }

    /// Load the completion record, creating one in `in_progress` on first
    /// interaction.
    async fn get_or_start(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<ResourceCompletion> {
        if let Some(existing) = self.storage.load_completion(user_id, resource_id).await? {
            return Ok(existing);
        }
        let library = Arc::clone(&self.library);
        let ctx = library
            .find_resource(resource_id)
            .ok_or_else(|| ProgressError::UnknownResource(resource_id.clone()))?;
        let record = ResourceCompletion::start(
            user_id,
            resource_id.clone(),
            ctx.module.id.clone(),
            ctx.pathway.id.clone(),
            ctx.resource.kind.requires_submission() || ctx.resource.upload.requires_upload,
        );
        self.storage.save_completion(&record).await?;
        tracing::info!("Started resource {} for learner {}", resource_id, user_id);
        Ok(record)
    }

    /// Begin tracking a resource. Idempotent: if a record already exists it
    /// is returned unchanged.
    pub async fn start(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<ResourceCompletion> {
        self.get_or_start(user_id, resource_id).await
    }

    /// Record partial progress: the percentage never decreases and is
    /// clamped to [0, 100]; time spent accumulates.
    pub async fn record_progress(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
        percentage: f32,
        time_spent_delta: u32,
    ) -> Result<ResourceCompletion> {
        let mut record = self.get_or_start(user_id, resource_id).await?;

        let clamped = percentage.clamp(0.0, 100.0);
        record.progress_percentage = record.progress_percentage.max(clamped);
        record.time_spent_minutes += time_spent_delta;
        record.last_accessed_at = chrono::Utc::now();

        self.storage.save_completion(&record).await?;
        Ok(record)
    }

    /// Mark a resource completed.
    ///
    /// Exercises and projects require at least one uploaded submission;
    /// quizzes complete only through [`ResourceTracker::record_quiz_score`].
    pub async fn complete(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<ResourceCompletion> {
        let kind = self.resource(resource_id)?.kind;

        match kind {
            ResourceKind::Video | ResourceKind::Article => {}
            ResourceKind::Quiz => {
                return Err(ProgressError::QuizScoreRequired(resource_id.clone()));
            }
            ResourceKind::Exercise | ResourceKind::Project => {
                let submissions = self.storage.list_submissions(user_id, resource_id).await?;
                let has_upload = submissions.iter().any(|s| s.storage_ref.is_some());
                if !has_upload {
                    return Err(ProgressError::UploadRequired(resource_id.clone()));
                }
            }
        }

        let record = self.get_or_start(user_id, resource_id).await?;
        let record = self.mark_completed(record).await?;
        Ok(record)
    }

    /// Undo a completion. Permitted only for video and article resources;
    /// the record returns to a state indistinguishable from never having
    /// been completed.
    pub async fn uncomplete(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<ResourceCompletion> {
        let kind = self.resource(resource_id)?.kind;
        if !kind.is_reversible() {
            return Err(ProgressError::IrreversibleCompletion(resource_id.clone()));
        }

        let mut record = self
            .storage
            .load_completion(user_id, resource_id)
            .await?
            .ok_or_else(|| ProgressError::UnknownResource(resource_id.clone()))?;

        if record.status == CompletionStatus::Completed {
            record.status = CompletionStatus::InProgress;
            record.completed_at = None;
            record.last_accessed_at = chrono::Utc::now();
            self.storage.save_completion(&record).await?;
            tracing::info!(
                "Unmarked resource {} for learner {}",
                resource_id,
                user_id
            );
        }
        Ok(record)
    }

    /// Record a scored quiz attempt.
    ///
    /// Every attempt lands in the ledger. Only a score at or above the
    /// resource's passing threshold completes the resource; sub-threshold
    /// attempts leave the completion untouched and permit a retake.
    pub async fn record_quiz_score(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
        score: u8,
    ) -> Result<QuizAttempt> {
        let resource = self.resource(resource_id)?;
        if resource.kind != ResourceKind::Quiz {
            return Err(ProgressError::NotAQuiz(resource_id.clone()));
        }
        let passing_score = resource.passing_score();

        let record = self.get_or_start(user_id, resource_id).await?;
        let attempt = QuizAttempt::record(user_id, resource_id.clone(), score, passing_score);
        self.storage.save_attempt(&attempt).await?;

        if attempt.passed {
            self.mark_completed(record).await?;
            tracing::info!(
                "Quiz {} passed with {}% by learner {}",
                resource_id,
                attempt.score,
                user_id
            );
        } else {
            tracing::debug!(
                "Quiz {} attempt at {}% below threshold {}%",
                resource_id,
                attempt.score,
                passing_score
            );
        }
        Ok(attempt)
    }

    /// Stamp a record completed, preserving forward-only ordering: records
    /// already in `submitted` or `reviewed` keep their status and only gain
    /// a completion timestamp.
    async fn mark_completed(
        &mut self,
        mut record: ResourceCompletion,
    ) -> Result<ResourceCompletion> {
        let now = chrono::Utc::now();
        if !record.status.is_consumed() {
            record.status = CompletionStatus::Completed;
        }
        if record.completed_at.is_none() {
            record.completed_at = Some(now);
        }
        record.progress_percentage = 100.0;
        record.last_accessed_at = now;
        self.storage.save_completion(&record).await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traverse_core::{Module, ModuleId, Pathway, PathwayId, QuizPolicy, UploadPolicy};
    use traverse_storage::MemoryStorage;

    fn resource(id: &str, kind: ResourceKind) -> Resource {
        Resource {
            id: ResourceId::from(id),
            kind,
            title: id.to_string(),
            description: None,
            url: None,
            duration_minutes: None,
            order_index: 0,
            upload: UploadPolicy::default(),
            quiz: matches!(kind, ResourceKind::Quiz).then(QuizPolicy::default),
        }
    }

    fn library() -> Arc<ContentLibrary> {
        let pathway = Pathway {
            id: PathwayId::from("mlops"),
            slug: "mlops".to_string(),
            title: "MLOps".to_string(),
            short_title: "MLOps".to_string(),
            instructor: "Robin".to_string(),
            description: String::new(),
            level: Default::default(),
            prerequisites: vec![],
            learning_outcomes: vec![],
            tools: vec![],
            tags: vec![],
            modules: vec![Module {
                id: ModuleId::from("module-1"),
                title: "Foundations".to_string(),
                description: String::new(),
                duration: None,
                difficulty: Default::default(),
                topics: vec![],
                resources: vec![
                    resource("intro-video", ResourceKind::Video),
                    resource("reading", ResourceKind::Article),
                    resource("lab", ResourceKind::Exercise),
                    resource("final-quiz", ResourceKind::Quiz),
                ],
                is_available: true,
            }],
            is_available: true,
        };
        Arc::new(ContentLibrary::new(vec![pathway]).unwrap())
    }

    fn tracker() -> ResourceTracker<MemoryStorage> {
        ResourceTracker::new(MemoryStorage::new(), library())
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let mut tracker = tracker();
        let user = UserId::new();
        let video = ResourceId::from("intro-video");

        let first = tracker.start(user, &video).await.unwrap();
        let second = tracker.start(user, &video).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.status, CompletionStatus::InProgress);
    }

    #[tokio::test]
    async fn unknown_resources_are_rejected() {
        let mut tracker = tracker();
        let result = tracker.start(UserId::new(), &ResourceId::from("ghost")).await;
        assert!(matches!(result, Err(ProgressError::UnknownResource(_))));
    }

    #[tokio::test]
    async fn progress_is_monotone_and_clamped() {
        let mut tracker = tracker();
        let user = UserId::new();
        let video = ResourceId::from("intro-video");

        let r = tracker.record_progress(user, &video, 40.0, 10).await.unwrap();
        assert_eq!(r.progress_percentage, 40.0);

        // A stale lower value must not regress the percentage.
        let r = tracker.record_progress(user, &video, 25.0, 5).await.unwrap();
        assert_eq!(r.progress_percentage, 40.0);
        assert_eq!(r.time_spent_minutes, 15);

        let r = tracker.record_progress(user, &video, 150.0, 0).await.unwrap();
        assert_eq!(r.progress_percentage, 100.0);
    }

    #[tokio::test]
    async fn complete_then_uncomplete_round_trips_for_video() {
        let mut tracker = tracker();
        let user = UserId::new();
        let video = ResourceId::from("intro-video");

        let started = tracker.start(user, &video).await.unwrap();
        let completed = tracker.complete(user, &video).await.unwrap();
        assert_eq!(completed.status, CompletionStatus::Completed);
        assert!(completed.completed_at.is_some());

        let restored = tracker.uncomplete(user, &video).await.unwrap();
        assert_eq!(restored.status, CompletionStatus::InProgress);
        assert!(restored.completed_at.is_none());
        assert_eq!(restored.id, started.id);
    }

    #[tokio::test]
    async fn exercise_completion_requires_an_upload() {
        let mut tracker = tracker();
        let user = UserId::new();
        let lab = ResourceId::from("lab");

        tracker.start(user, &lab).await.unwrap();
        let result = tracker.complete(user, &lab).await;
        assert!(matches!(result, Err(ProgressError::UploadRequired(_))));

        // The failed attempt must not have mutated the record.
        let record = tracker
            .storage()
            .load_completion(user, &lab)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, CompletionStatus::InProgress);
        assert!(record.completed_at.is_none());
    }

    #[tokio::test]
    async fn exercise_uncomplete_is_irreversible() {
        let mut tracker = tracker();
        let result = tracker
            .uncomplete(UserId::new(), &ResourceId::from("lab"))
            .await;
        assert!(matches!(result, Err(ProgressError::IrreversibleCompletion(_))));
    }

    #[tokio::test]
    async fn quiz_cannot_be_completed_directly() {
        let mut tracker = tracker();
        let result = tracker
            .complete(UserId::new(), &ResourceId::from("final-quiz"))
            .await;
        assert!(matches!(result, Err(ProgressError::QuizScoreRequired(_))));
    }

    #[tokio::test]
    async fn failing_quiz_score_leaves_status_untouched() {
        let mut tracker = tracker();
        let user = UserId::new();
        let quiz = ResourceId::from("final-quiz");

        let attempt = tracker.record_quiz_score(user, &quiz, 79).await.unwrap();
        assert!(!attempt.passed);

        let record = tracker
            .storage()
            .load_completion(user, &quiz)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, CompletionStatus::InProgress);
    }

    #[tokio::test]
    async fn passing_quiz_score_completes_the_resource() {
        let mut tracker = tracker();
        let user = UserId::new();
        let quiz = ResourceId::from("final-quiz");

        let attempt = tracker.record_quiz_score(user, &quiz, 80).await.unwrap();
        assert!(attempt.passed);

        let record = tracker
            .storage()
            .load_completion(user, &quiz)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, CompletionStatus::Completed);
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn every_quiz_attempt_lands_in_the_ledger() {
        let mut tracker = tracker();
        let user = UserId::new();
        let quiz = ResourceId::from("final-quiz");

        tracker.record_quiz_score(user, &quiz, 40).await.unwrap();
        tracker.record_quiz_score(user, &quiz, 90).await.unwrap();
        tracker.record_quiz_score(user, &quiz, 100).await.unwrap();

        let attempts = tracker
            .storage()
            .list_attempts(user, &quiz)
            .await
            .unwrap();
        assert_eq!(attempts.len(), 3);
        assert!(attempts[2].is_perfect());
    }

    #[tokio::test]
    async fn scoring_a_non_quiz_is_rejected() {
        let mut tracker = tracker();
        let result = tracker
            .record_quiz_score(UserId::new(), &ResourceId::from("intro-video"), 90)
            .await;
        assert!(matches!(result, Err(ProgressError::NotAQuiz(_))));
    }
}
