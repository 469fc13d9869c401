//! Quiz attempt ledger.

use serde::{Deserialize, Serialize};
use crate::id::{AttemptId, ResourceId, UserId};
use crate::Time;

/// One scored quiz attempt.
///
/// Every attempt is recorded, passing or not. The ledger is the
/// authoritative source for perfect-score derivations; nothing is
/// approximated from aggregate percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    /// Unique identifier
    pub id: AttemptId,

    /// Owning learner
    pub user_id: UserId,

    /// Quiz resource attempted
    pub resource_id: ResourceId,

    /// Score in percent, 0-100
    pub score: u8,

    /// Whether the score met the resource's passing threshold
    pub passed: bool,

    /// When the attempt was made
    pub attempted_at: Time,
}

impl QuizAttempt {
    /// Record an attempt against a passing threshold.
    pub fn record(user_id: UserId, resource_id: ResourceId, score: u8, passing_score: u8) -> Self {
        Self {
            id: AttemptId::new(),
            user_id,
            resource_id,
            score: score.min(100),
            passed: score >= passing_score,
            attempted_at: chrono::Utc::now(),
        }
    }

    /// Whether this attempt scored a perfect 100.
    pub fn is_perfect(&self) -> bool {
        self.score == 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_is_derived_from_threshold() {
        let user = UserId::new();
        let quiz = ResourceId::from("quiz-1");
        assert!(!QuizAttempt::record(user, quiz.clone(), 79, 80).passed);
        assert!(QuizAttempt::record(user, quiz.clone(), 80, 80).passed);
        assert!(QuizAttempt::record(user, quiz, 100, 80).passed);
    }

    #[test]
    fn score_is_clamped_to_100() {
        let attempt = QuizAttempt::record(UserId::new(), ResourceId::from("quiz-1"), 250, 80);
        assert_eq!(attempt.score, 100);
        assert!(attempt.is_perfect());
    }
}
