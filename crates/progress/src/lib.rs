//! Progress engine for Traverse.
//!
//! Resource completion tracking, submission review, module gating, pathway
//! unlock derivation and snapshot aggregation.

#![warn(missing_docs)]

pub mod tracker;
pub mod submission;
pub mod gate;
pub mod unlock;
pub mod aggregator;

pub use tracker::ResourceTracker;
pub use submission::{validate_file, SubmissionTracker, SubmissionVerdict};
pub use gate::{derive_module_state, resource_satisfied, ModuleGate, ModuleState, ReviewVerdict};
pub use unlock::{unlock, UnlockState};
pub use aggregator::ProgressAggregator;

use traverse_core::{ModuleId, ResourceId, SubmissionId};

/// Error type for progress operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors raised by the progress engine.
///
/// Validation-class variants are resolved locally and never reach storage;
/// storage and gateway failures leave the prior state untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// File rejected before any transfer was attempted.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Completion of an exercise or project was requested with no uploaded
    /// submission.
    #[error("resource {0} requires an uploaded submission before completion")]
    UploadRequired(ResourceId),

    /// Uncomplete was requested for a resource kind that keeps its
    /// completion for audit integrity.
    #[error("completion of resource {0} cannot be undone")]
    IrreversibleCompletion(ResourceId),

    /// Quizzes complete through scoring, not through direct completion.
    #[error("resource {0} is a quiz; completion is driven by its score")]
    QuizScoreRequired(ResourceId),

    /// Quiz scoring was requested for a non-quiz resource.
    #[error("resource {0} is not a quiz")]
    NotAQuiz(ResourceId),

    /// The resource does not accept uploads.
    #[error("resource {0} does not accept uploaded submissions")]
    UploadNotAccepted(ResourceId),

    /// A new submission was attempted where resubmission is disallowed.
    #[error("resource {0} does not allow resubmission")]
    ResubmissionNotAllowed(ResourceId),

    /// The resource id is not in the content tables.
    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    /// The module id is not in the content tables.
    #[error("unknown module: {0}")]
    UnknownModule(ModuleId),

    /// The submission id has no record.
    #[error("unknown submission: {0}")]
    UnknownSubmission(SubmissionId),

    /// A reviewer decision was applied to a submission that is not awaiting
    /// review.
    #[error("submission {0} is not awaiting review")]
    NotReviewable(SubmissionId),

    /// A module was submitted for review before all of its resources were
    /// satisfied.
    #[error("module {0} is not ready for review")]
    NotEligibleForReview(ModuleId),

    /// A reviewer decision was applied to a module with no pending review.
    #[error("module {0} has no pending review")]
    NoPendingReview(ModuleId),

    /// Persistence failure.
    #[error(transparent)]
    Storage(#[from] traverse_storage::StorageError),

    /// External collaborator failure (auth, blob store).
    #[error(transparent)]
    Gateway(#[from] traverse_gateway::GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use traverse_content::ContentLibrary;
    use traverse_core::{
        ApprovalStatus, Module, Pathway, PathwayId, Resource, ResourceKind, UploadFile,
        UploadPolicy, UserId,
    };
    use traverse_storage::MemoryStorage;

    type Shared = Arc<Mutex<MemoryStorage>>;

    fn resource(id: &str, kind: ResourceKind) -> Resource {
        Resource {
            id: ResourceId::from(id),
            kind,
            title: id.to_string(),
            description: None,
            url: None,
            duration_minutes: None,
            order_index: 0,
            upload: UploadPolicy {
                requires_upload: kind.requires_submission(),
                ..Default::default()
            },
            quiz: None,
        }
    }

    fn module_of(id: &str, resources: Vec<Resource>) -> Module {
        Module {
            id: ModuleId::from(id),
            title: id.to_string(),
            description: String::new(),
            duration: None,
            difficulty: Default::default(),
            topics: vec![],
            resources,
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
            modules: vec![
                module_of(
                    "mlops-1",
                    vec![
                        resource("intro-video", ResourceKind::Video),
                        resource("lab", ResourceKind::Exercise),
                    ],
                ),
                module_of("mlops-2", vec![resource("wrap-up", ResourceKind::Video)]),
            ],
            is_available: true,
        };
        Arc::new(ContentLibrary::new(vec![pathway]).unwrap())
    }

    fn deliverable() -> UploadFile {
        UploadFile {
            name: "lab.zip".to_string(),
            size_bytes: 4096,
            content_type: "application/zip".to_string(),
            bytes: vec![0u8; 32],
        }
    }

    /// One learner's journey across the services sharing a single backend:
    /// consume resources, upload a deliverable, get rejected, resubmit,
    /// get approved, and watch the aggregate unlock the next module.
    #[tokio::test]
    async fn module_review_journey() {
        let shared: Shared = Arc::new(Mutex::new(MemoryStorage::new()));
        let library = library();
        let user = UserId::new();
        let module_id = ModuleId::from("mlops-1");
        let pathway_id = PathwayId::from("mlops");

        let mut resources = ResourceTracker::new(Arc::clone(&shared), Arc::clone(&library));
        let mut submissions = SubmissionTracker::new(
            Arc::clone(&shared),
            Arc::new(traverse_gateway::MemoryBlobStore::new()),
            Arc::clone(&library),
        );
        let mut gate = ModuleGate::new(Arc::clone(&shared), Arc::clone(&library));
        let mut aggregator = ProgressAggregator::new(Arc::clone(&shared), Arc::clone(&library));

        resources
            .complete(user, &ResourceId::from("intro-video"))
            .await
            .unwrap();

        // The exercise gates module submission until a deliverable exists.
        let state = gate.state(user, &module_id).await.unwrap();
        assert!(!state.eligible_for_review);

        let uploaded = submissions
            .upload(user, &ResourceId::from("lab"), deliverable())
            .await
            .unwrap();
        resources.complete(user, &ResourceId::from("lab")).await.unwrap();

        let state = gate.state(user, &module_id).await.unwrap();
        assert!(state.resources_complete);
        assert!(state.eligible_for_review);

        gate.submit_for_review(user, &module_id).await.unwrap();
        gate.apply_decision(
            user,
            &module_id,
            ReviewVerdict::Reject,
            "reviewer-a",
            Some("add a readme".to_string()),
        )
        .await
        .unwrap();

        // A rejected submission still satisfies the resource predicate; the
        // rejection lives on the module's approval status instead.
        submissions
            .review(
                uploaded.id,
                SubmissionVerdict::Reject,
                "reviewer-a",
                None,
                None,
            )
            .await
            .unwrap();
        let state = gate.state(user, &module_id).await.unwrap();
        assert!(state.resources_complete);
        assert_eq!(state.approval_status, Some(ApprovalStatus::Rejected));
        assert!(!state.completed);

        // Resubmit and approve.
        submissions
            .upload(user, &ResourceId::from("lab"), deliverable())
            .await
            .unwrap();
        gate.submit_for_review(user, &module_id).await.unwrap();
        gate.apply_decision(user, &module_id, ReviewVerdict::Approve, "reviewer-a", None)
            .await
            .unwrap();

        let state = gate.state(user, &module_id).await.unwrap();
        assert!(state.completed);

        // History kept both uploads.
        let history = submissions
            .history(user, &ResourceId::from("lab"))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);

        // Aggregate: 1 of 2 modules complete, next module unlocked.
        let snapshot = aggregator.aggregate(user).await.unwrap();
        assert_eq!(snapshot.modules_completed, 1);
        assert_eq!(snapshot.pathways_started, 1);
        let progress = snapshot.pathway(&pathway_id).unwrap();
        assert_eq!(progress.progress, 50.0);
        assert_eq!(progress.current_module, Some(ModuleId::from("mlops-2")));

        let flags = [true, false];
        let unlocked = unlock(&flags, progress.progress);
        assert_eq!(unlocked.unlocked_count, 2);
        assert_eq!(unlocked.current_module, Some(1));
    }
}
