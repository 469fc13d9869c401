//! Achievement definitions and per-learner unlock state.

use serde::{Deserialize, Serialize};
use crate::id::{PathwayId, UserId};
use crate::Time;

/// A static, content-defined achievement rule.
///
/// Definitions are never created or destroyed at runtime; only the derived
/// per-learner unlock state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Stable identifier, e.g. `first-steps`
    pub id: String,

    /// Display title
    pub title: String,

    /// What the learner must do
    pub description: String,

    /// Rarity tier
    pub rarity: Rarity,

    /// Grouping category
    pub category: AchievementCategory,

    /// The declarative unlock rule
    pub requirement: Requirement,

    /// Points awarded on unlock
    pub points: u32,
}

/// Rarity tier of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Easily earned
    Common,
    /// Takes sustained effort
    Rare,
    /// Takes substantial effort
    Epic,
    /// The long haul
    Legendary,
}

/// Grouping category of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    /// Overall progress milestones
    Progress,
    /// Finishing pathways
    Completion,
    /// Breadth across pathways
    Exploration,
    /// Depth within a pathway
    Mastery,
    /// Consistency over time
    Streak,
}

/// Declarative unlock requirement: a kind, a threshold, and an optional
/// pathway scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Which counter the rule inspects
    pub kind: RequirementKind,

    /// Threshold the counter must reach
    pub value: u32,

    /// Restricts `pathway_complete` to one specific pathway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathway: Option<PathwayId>,
}

/// The counter a requirement is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    /// Mean progress across all pathways reaches the threshold
    TotalProgress,
    /// Number of completed pathways reaches the threshold, or the named
    /// pathway reaches 100%
    PathwayComplete,
    /// Number of started pathways reaches the threshold
    PathwaysStarted,
    /// Number of completed modules reaches the threshold
    ModulesComplete,
    /// Number of perfect quiz scores reaches the threshold
    PerfectScore,
}

/// Per-learner unlock state of one achievement.
///
/// Persisted so that `unlocked_at` is stamped exactly once, on the
/// locked-to-unlocked transition, and never rewritten by re-evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementStatus {
    /// Achievement definition id
    pub achievement_id: String,

    /// Owning learner
    pub user_id: UserId,

    /// Whether the achievement is unlocked
    pub unlocked: bool,

    /// When the unlock happened
    pub unlocked_at: Option<Time>,
}

impl AchievementStatus {
    /// A locked status for a definition the learner has no record for yet.
    pub fn locked(user_id: UserId, achievement_id: impl Into<String>) -> Self {
        Self {
            achievement_id: achievement_id.into(),
            user_id,
            unlocked: false,
            unlocked_at: None,
        }
    }
}
