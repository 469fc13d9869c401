//! Module review record - the approval side of module completion.

use serde::{Deserialize, Serialize};
use crate::id::{ModuleId, PathwayId, ReviewId, UserId};
use crate::module::ApprovalStatus;
use crate::Time;

/// Per-(learner, module) review record.
///
/// Created when a learner submits a module for review; the state machine is
/// `pending -> approved` (terminal) or `pending -> rejected -> pending` on
/// resubmission. Every decision is appended to `decisions`, so reviewer
/// feedback survives resubmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReview {
    /// Unique identifier
    pub id: ReviewId,

    /// Owning learner
    pub user_id: UserId,

    /// Module under review
    pub module_id: ModuleId,

    /// Pathway the module belongs to
    pub pathway_id: PathwayId,

    /// Current status
    pub approval_status: ApprovalStatus,

    /// When the module was (last) submitted for review
    pub submitted_at: Time,

    /// When the latest decision was made
    pub decided_at: Option<Time>,

    /// Reviewer of the latest decision
    pub reviewed_by: Option<String>,

    /// Comments from the latest decision
    pub review_comments: Option<String>,

    /// Full decision history, oldest first
    pub decisions: Vec<ReviewDecision>,
}

impl ModuleReview {
    /// Create a fresh pending review.
    pub fn submit(user_id: UserId, module_id: ModuleId, pathway_id: PathwayId) -> Self {
        Self {
            id: ReviewId::new(),
            user_id,
            module_id,
            pathway_id,
            approval_status: ApprovalStatus::Pending,
            submitted_at: chrono::Utc::now(),
            decided_at: None,
            reviewed_by: None,
            review_comments: None,
            decisions: Vec::new(),
        }
    }

    /// Record a reviewer decision, appending to the history.
    pub fn decide(
        &mut self,
        status: ApprovalStatus,
        reviewed_by: impl Into<String>,
        comments: Option<String>,
    ) {
        let now = chrono::Utc::now();
        let reviewed_by = reviewed_by.into();
        self.decisions.push(ReviewDecision {
            status,
            decided_by: reviewed_by.clone(),
            decided_at: now,
            comments: comments.clone(),
        });
        self.approval_status = status;
        self.decided_at = Some(now);
        self.reviewed_by = Some(reviewed_by);
        self.review_comments = comments;
    }

    /// Re-submit after a rejection, returning to pending. Decision history
    /// is retained.
    pub fn resubmit(&mut self) {
        self.approval_status = ApprovalStatus::Pending;
        self.submitted_at = chrono::Utc::now();
        self.reviewed_by = None;
        self.review_comments = None;
        self.decided_at = None;
    }
}

/// One reviewer decision on a module review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    /// The decision taken
    pub status: ApprovalStatus,

    /// Who decided
    pub decided_by: String,

    /// When the decision was made
    pub decided_at: Time,

    /// Reviewer feedback
    pub comments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> ModuleReview {
        ModuleReview::submit(
            UserId::new(),
            ModuleId::from("module-1"),
            PathwayId::from("mlops"),
        )
    }

    #[test]
    fn submit_starts_pending() {
        let r = review();
        assert_eq!(r.approval_status, ApprovalStatus::Pending);
        assert!(r.decisions.is_empty());
    }

    #[test]
    fn rejection_then_resubmit_keeps_history() {
        let mut r = review();
        r.decide(
            ApprovalStatus::Rejected,
            "reviewer-a",
            Some("needs more depth".to_string()),
        );
        assert_eq!(r.approval_status, ApprovalStatus::Rejected);
        assert_eq!(r.review_comments.as_deref(), Some("needs more depth"));

        r.resubmit();
        assert_eq!(r.approval_status, ApprovalStatus::Pending);
        assert!(r.review_comments.is_none());
        assert_eq!(r.decisions.len(), 1);
        assert_eq!(r.decisions[0].comments.as_deref(), Some("needs more depth"));
    }

    #[test]
    fn approval_is_recorded_with_reviewer() {
        let mut r = review();
        r.decide(ApprovalStatus::Approved, "reviewer-b", None);
        assert_eq!(r.approval_status, ApprovalStatus::Approved);
        assert_eq!(r.reviewed_by.as_deref(), Some("reviewer-b"));
        assert!(r.decided_at.is_some());
    }
}
