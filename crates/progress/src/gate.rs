//! Module gate: derives module completion from resource records and runs
//! the review flow.
//!
//! Module state is a pure projection, recomputed from the learner's
//! completion, submission and review records on every relevant mutation.
//! Nothing here patches flags ad hoc; divergence is impossible because the
//! flags are never stored independently.

use std::collections::HashMap;
use std::sync::Arc;
use traverse_content::ContentLibrary;
use traverse_core::{
    ApprovalStatus, Module, ModuleId, ModuleReview, Resource, ResourceCompletion, ResourceId,
    ResourceKind, ResourceSubmission, Time, UserId,
};
use traverse_gateway::ReviewNotifier;
use traverse_storage::Storage;

use crate::{ProgressError, Result};

/// Reviewer decision on a submitted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    /// Accept the module; it becomes completed
    Approve,
    /// Return the module; the learner may resubmit
    Reject,
}

/// Derived per-learner state of one module.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ModuleState {
    /// The module this state describes
    pub module_id: ModuleId,

    /// Resources satisfying their type-specific predicate
    pub satisfied_resources: usize,

    /// Total resources in the module
    pub total_resources: usize,

    /// Whether every resource satisfies its predicate
    pub resources_complete: bool,

    /// Whether the learner may submit the module for review now
    pub eligible_for_review: bool,

    /// Review status, if the module has been submitted
    pub approval_status: Option<ApprovalStatus>,

    /// Whether the module counts as completed (approved by review)
    pub completed: bool,

    /// When the approval happened
    pub completed_at: Option<Time>,

    /// Latest reviewer feedback
    pub review_comments: Option<String>,
}

/// Whether one resource satisfies its type-specific completion predicate.
///
/// Videos, articles and quizzes are satisfied by a consumed completion
/// status (a quiz record only reaches that status through a passing
/// attempt). Exercises and projects additionally need at least one
/// submission whose artifact actually reached the blob store; approval of
/// that submission is a module-level concern, not a resource-level one.
pub fn resource_satisfied(
    resource: &Resource,
    completion: Option<&ResourceCompletion>,
    submissions: &[ResourceSubmission],
) -> bool {
    let Some(completion) = completion else {
        return false;
    };
    match resource.kind {
        ResourceKind::Video | ResourceKind::Article | ResourceKind::Quiz => {
            completion.status.is_consumed()
        }
        ResourceKind::Exercise | ResourceKind::Project => {
            completion.status.is_consumed()
                && submissions.iter().any(|s| s.storage_ref.is_some())
        }
    }
}

/// Derive a module's state from the learner's records.
pub fn derive_module_state(
    module: &Module,
    completions: &HashMap<ResourceId, ResourceCompletion>,
    submissions: &HashMap<ResourceId, Vec<ResourceSubmission>>,
    review: Option<&ModuleReview>,
) -> ModuleState {
    static NO_SUBMISSIONS: Vec<ResourceSubmission> = Vec::new();

    let satisfied_resources = module
        .resources
        .iter()
        .filter(|r| {
            resource_satisfied(
                r,
                completions.get(&r.id),
                submissions.get(&r.id).unwrap_or(&NO_SUBMISSIONS),
            )
        })
        .count();
    let total_resources = module.resources.len();
    let resources_complete = satisfied_resources == total_resources;

    let approval_status = review.map(|r| r.approval_status);
    let completed = approval_status == Some(ApprovalStatus::Approved);
    let eligible_for_review = resources_complete
        && !matches!(
            approval_status,
            Some(ApprovalStatus::Pending) | Some(ApprovalStatus::Approved)
        );

    ModuleState {
        module_id: module.id.clone(),
        satisfied_resources,
        total_resources,
        resources_complete,
        eligible_for_review,
        approval_status,
        completed,
        completed_at: if completed {
            review.and_then(|r| r.decided_at)
        } else {
            None
        },
        review_comments: review.and_then(|r| r.review_comments.clone()),
    }
}

/// Gate service: state derivation plus the review flow.
pub struct ModuleGate<S: Storage> {
    storage: S,
    library: Arc<ContentLibrary>,
    notifier: Option<Arc<ReviewNotifier>>,
}

impl<S: Storage> ModuleGate<S> {
    /// Create a gate over a storage backend and content tables.
    pub fn new(storage: S, library: Arc<ContentLibrary>) -> Self {
        Self {
            storage,
            library,
            notifier: None,
        }
    }

    /// Attach a reviewer notifier. Notification is best-effort.
    pub fn with_notifier(mut self, notifier: Arc<ReviewNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Access the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Recompute the derived state of a module for a learner.
    pub async fn state(&self, user_id: UserId, module_id: &ModuleId) -> Result<ModuleState> {
        let (_, module) = self
            .library
            .find_module(module_id)
            .ok_or_else(|| ProgressError::UnknownModule(module_id.clone()))?;

        let mut completions = HashMap::new();
        let mut submissions = HashMap::new();
        for resource in &module.resources {
            if let Some(completion) =
                self.storage.load_completion(user_id, &resource.id).await?
            {
                completions.insert(resource.id.clone(), completion);
            }
            let history = self.storage.list_submissions(user_id, &resource.id).await?;
            if !history.is_empty() {
                submissions.insert(resource.id.clone(), history);
            }
        }
        let review = self.storage.load_review(user_id, module_id).await?;

        Ok(derive_module_state(
            module,
            &completions,
            &submissions,
            review.as_ref(),
        ))
    }

    /// Submit a module for review.
    ///
    /// Requires every resource to satisfy its predicate. Submitting does
    /// not complete the module; it moves the review to `pending`. A
    /// rejected module may be re-submitted, keeping its decision history.
    /// Re-submitting while already pending returns the existing review.
    pub async fn submit_for_review(
        &mut self,
        user_id: UserId,
        module_id: &ModuleId,
    ) -> Result<ModuleReview> {
        let library = Arc::clone(&self.library);
        let (pathway, _) = library
            .find_module(module_id)
            .ok_or_else(|| ProgressError::UnknownModule(module_id.clone()))?;
        let pathway_id = pathway.id.clone();

        let state = self.state(user_id, module_id).await?;
        let review = match self.storage.load_review(user_id, module_id).await? {
            Some(existing) if existing.approval_status == ApprovalStatus::Pending => {
                return Ok(existing);
            }
            Some(mut rejected) => {
                if !state.eligible_for_review {
                    return Err(ProgressError::NotEligibleForReview(module_id.clone()));
                }
                rejected.resubmit();
                rejected
            }
            None => {
                if !state.eligible_for_review {
                    return Err(ProgressError::NotEligibleForReview(module_id.clone()));
                }
                ModuleReview::submit(user_id, module_id.clone(), pathway_id.clone())
            }
        };

        self.storage.save_review(&review).await?;
        tracing::info!(
            "Module {} submitted for review by learner {}",
            module_id,
            user_id
        );

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier
                .review_requested(user_id, &pathway_id, module_id)
                .await
            {
                tracing::warn!("Review notification failed: {}", e);
            }
        }

        Ok(review)
    }

    /// Apply an external reviewer's decision to a pending module review.
    ///
    /// Approval is terminal and completes the module; rejection records the
    /// comments and reopens the path to resubmission.
    pub async fn apply_decision(
        &mut self,
        user_id: UserId,
        module_id: &ModuleId,
        verdict: ReviewVerdict,
        reviewed_by: impl Into<String>,
        comments: Option<String>,
    ) -> Result<ModuleReview> {
        let mut review = self
            .storage
            .load_review(user_id, module_id)
            .await?
            .ok_or_else(|| ProgressError::NoPendingReview(module_id.clone()))?;

        if review.approval_status != ApprovalStatus::Pending {
            return Err(ProgressError::NoPendingReview(module_id.clone()));
        }

        let status = match verdict {
            ReviewVerdict::Approve => ApprovalStatus::Approved,
            ReviewVerdict::Reject => ApprovalStatus::Rejected,
        };
        review.decide(status, reviewed_by, comments);
        self.storage.save_review(&review).await?;

        tracing::info!(
            "Module {} {} for learner {}",
            module_id,
            status.as_str(),
            user_id
        );
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traverse_core::{
        CompletionStatus, Pathway, PathwayId, QuizPolicy, SubmissionStatus, UploadFile,
        UploadPolicy,
    };
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

    fn module() -> Module {
        Module {
            id: ModuleId::from("module-1"),
            title: "Foundations".to_string(),
            description: String::new(),
            duration: None,
            difficulty: Default::default(),
            topics: vec![],
            resources: vec![
                resource("intro-video", ResourceKind::Video),
                resource("lab", ResourceKind::Exercise),
            ],
            is_available: true,
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
            modules: vec![module()],
            is_available: true,
        };
        Arc::new(ContentLibrary::new(vec![pathway]).unwrap())
    }

    fn completion(resource_id: &str, user: UserId, status: CompletionStatus) -> ResourceCompletion {
        let mut record = ResourceCompletion::start(
            user,
            ResourceId::from(resource_id),
            ModuleId::from("module-1"),
            PathwayId::from("mlops"),
            false,
        );
        record.status = status;
        record
    }

    fn stored_submission(
        resource_id: &str,
        user: UserId,
        status: SubmissionStatus,
    ) -> ResourceSubmission {
        let file = UploadFile {
            name: "work.zip".to_string(),
            size_bytes: 128,
            content_type: "application/zip".to_string(),
            bytes: vec![],
        };
        let mut submission =
            ResourceSubmission::begin(user, ResourceId::from(resource_id), &file);
        submission.status = status;
        if status != SubmissionStatus::Failed && status != SubmissionStatus::Uploading {
            submission.storage_ref = Some(traverse_core::StorageRef("mem://x".to_string()));
        }
        submission
    }

    #[test]
    fn video_predicate_follows_consumed_status() {
        let user = UserId::new();
        let video = resource("intro-video", ResourceKind::Video);
        assert!(!resource_satisfied(&video, None, &[]));

        let record = completion("intro-video", user, CompletionStatus::InProgress);
        assert!(!resource_satisfied(&video, Some(&record), &[]));

        let record = completion("intro-video", user, CompletionStatus::Completed);
        assert!(resource_satisfied(&video, Some(&record), &[]));
    }

    #[test]
    fn exercise_predicate_needs_a_stored_submission() {
        let user = UserId::new();
        let lab = resource("lab", ResourceKind::Exercise);
        let record = completion("lab", user, CompletionStatus::Submitted);

        assert!(!resource_satisfied(&lab, Some(&record), &[]));

        let failed = stored_submission("lab", user, SubmissionStatus::Failed);
        assert!(!resource_satisfied(&lab, Some(&record), &[failed]));

        // A rejected submission still counts: an upload exists.
        let rejected = stored_submission("lab", user, SubmissionStatus::Rejected);
        assert!(resource_satisfied(&lab, Some(&record), &[rejected]));
    }

    async fn satisfy_all(storage: &mut MemoryStorage, user: UserId) {
        storage
            .save_completion(&completion("intro-video", user, CompletionStatus::Completed))
            .await
            .unwrap();
        storage
            .save_completion(&completion("lab", user, CompletionStatus::Submitted))
            .await
            .unwrap();
        storage
            .save_submission(&stored_submission("lab", user, SubmissionStatus::Uploaded))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn incomplete_module_cannot_be_submitted() {
        let mut gate = ModuleGate::new(MemoryStorage::new(), library());
        let result = gate
            .submit_for_review(UserId::new(), &ModuleId::from("module-1"))
            .await;
        assert!(matches!(result, Err(ProgressError::NotEligibleForReview(_))));
    }

    #[tokio::test]
    async fn submission_sets_pending_not_completed() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        satisfy_all(&mut storage, user).await;
        let mut gate = ModuleGate::new(storage, library());

        let review = gate
            .submit_for_review(user, &ModuleId::from("module-1"))
            .await
            .unwrap();
        assert_eq!(review.approval_status, ApprovalStatus::Pending);

        let state = gate.state(user, &ModuleId::from("module-1")).await.unwrap();
        assert!(state.resources_complete);
        assert!(!state.completed);
        assert_eq!(state.approval_status, Some(ApprovalStatus::Pending));
        assert!(!state.eligible_for_review);
    }

    #[tokio::test]
    async fn approval_completes_the_module() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        satisfy_all(&mut storage, user).await;
        let mut gate = ModuleGate::new(storage, library());
        let module_id = ModuleId::from("module-1");

        gate.submit_for_review(user, &module_id).await.unwrap();
        gate.apply_decision(user, &module_id, ReviewVerdict::Approve, "reviewer-a", None)
            .await
            .unwrap();

        let state = gate.state(user, &module_id).await.unwrap();
        assert!(state.completed);
        assert!(state.completed_at.is_some());
        assert_eq!(state.approval_status, Some(ApprovalStatus::Approved));
        assert!(!state.eligible_for_review);
    }

    #[tokio::test]
    async fn rejection_keeps_module_incomplete_and_allows_resubmission() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        satisfy_all(&mut storage, user).await;
        let mut gate = ModuleGate::new(storage, library());
        let module_id = ModuleId::from("module-1");

        gate.submit_for_review(user, &module_id).await.unwrap();
        gate.apply_decision(
            user,
            &module_id,
            ReviewVerdict::Reject,
            "reviewer-a",
            Some("rework the lab".to_string()),
        )
        .await
        .unwrap();

        let state = gate.state(user, &module_id).await.unwrap();
        assert!(!state.completed);
        assert_eq!(state.approval_status, Some(ApprovalStatus::Rejected));
        assert_eq!(state.review_comments.as_deref(), Some("rework the lab"));
        assert!(state.eligible_for_review);

        // Resubmission returns to pending with history intact.
        let review = gate.submit_for_review(user, &module_id).await.unwrap();
        assert_eq!(review.approval_status, ApprovalStatus::Pending);
        assert_eq!(review.decisions.len(), 1);
    }

    #[tokio::test]
    async fn submitting_while_pending_is_idempotent() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        satisfy_all(&mut storage, user).await;
        let mut gate = ModuleGate::new(storage, library());
        let module_id = ModuleId::from("module-1");

        let first = gate.submit_for_review(user, &module_id).await.unwrap();
        let second = gate.submit_for_review(user, &module_id).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn decisions_require_a_pending_review() {
        let mut gate = ModuleGate::new(MemoryStorage::new(), library());
        let result = gate
            .apply_decision(
                UserId::new(),
                &ModuleId::from("module-1"),
                ReviewVerdict::Approve,
                "reviewer-a",
                None,
            )
            .await;
        assert!(matches!(result, Err(ProgressError::NoPendingReview(_))));
    }
}
