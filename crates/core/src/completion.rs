//! Per-learner resource completion record.

use serde::{Deserialize, Serialize};
use crate::id::{CompletionId, ModuleId, PathwayId, ResourceId, UserId};
use crate::Time;

/// Lifecycle record tracking one learner's consumption of one resource.
///
/// Created on first interaction; transitions forward only. The single
/// exception is the explicit uncomplete operation permitted for video and
/// article resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCompletion {
    /// Unique identifier
    pub id: CompletionId,

    /// Owning learner
    pub user_id: UserId,

    /// The resource being tracked
    pub resource_id: ResourceId,

    /// Module the resource belongs to
    pub module_id: ModuleId,

    /// Pathway the module belongs to
    pub pathway_id: PathwayId,

    /// Current lifecycle status
    pub status: CompletionStatus,

    /// Progress percentage, 0-100, monotonically non-decreasing
    pub progress_percentage: f32,

    /// Accumulated time spent, in minutes
    pub time_spent_minutes: u32,

    /// When the learner first interacted with the resource
    pub started_at: Time,

    /// When the resource was completed, if it has been
    pub completed_at: Option<Time>,

    /// Last interaction timestamp
    pub last_accessed_at: Time,

    /// Whether an upload is required before completion counts
    pub submission_required: bool,

    /// Number of submissions made against this resource
    pub submission_count: u32,
}

impl ResourceCompletion {
    /// Create a fresh record in `in_progress` for a first interaction.
    pub fn start(
        user_id: UserId,
        resource_id: ResourceId,
        module_id: ModuleId,
        pathway_id: PathwayId,
        submission_required: bool,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: CompletionId::new(),
            user_id,
            resource_id,
            module_id,
            pathway_id,
            status: CompletionStatus::InProgress,
            progress_percentage: 0.0,
            time_spent_minutes: 0,
            started_at: now,
            completed_at: None,
            last_accessed_at: now,
            submission_required,
            submission_count: 0,
        }
    }
}

/// Lifecycle status of a resource completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Record exists but no meaningful interaction yet
    NotStarted,
    /// Learner is working through the resource
    InProgress,
    /// Resource consumed to completion
    Completed,
    /// A deliverable has been uploaded and awaits review
    Submitted,
    /// An uploaded deliverable has received a review decision
    Reviewed,
}

impl CompletionStatus {
    /// Whether this status counts as the resource having been consumed.
    pub fn is_consumed(&self) -> bool {
        matches!(
            self,
            CompletionStatus::Completed | CompletionStatus::Submitted | CompletionStatus::Reviewed
        )
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::NotStarted => "not_started",
            CompletionStatus::InProgress => "in_progress",
            CompletionStatus::Completed => "completed",
            CompletionStatus::Submitted => "submitted",
            CompletionStatus::Reviewed => "reviewed",
        }
    }
}
