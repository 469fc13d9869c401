//! Achievement rule engine.

use traverse_core::{
    AchievementDef, AchievementStatus, ProgressSnapshot, Requirement, RequirementKind, UserId,
};
use traverse_storage::Storage;

use crate::Result;

/// Whether a requirement is met by a snapshot. Pure predicate dispatch on
/// the requirement kind.
pub fn requirement_met(requirement: &Requirement, snapshot: &ProgressSnapshot) -> bool {
    match requirement.kind {
        RequirementKind::TotalProgress => snapshot.total_progress >= requirement.value as f32,
        RequirementKind::PathwayComplete => match &requirement.pathway {
            Some(pathway_id) => snapshot.pathway_percent(pathway_id) >= 100.0,
            None => snapshot.pathways_completed >= requirement.value,
        },
        RequirementKind::PathwaysStarted => snapshot.pathways_started >= requirement.value,
        RequirementKind::ModulesComplete => snapshot.modules_completed >= requirement.value,
        RequirementKind::PerfectScore => snapshot.perfect_scores >= requirement.value,
    }
}

/// How far a snapshot is toward a requirement, before any clamping.
fn current_value(requirement: &Requirement, snapshot: &ProgressSnapshot) -> u32 {
    match requirement.kind {
        RequirementKind::TotalProgress => snapshot.total_progress.floor() as u32,
        RequirementKind::PathwayComplete => match &requirement.pathway {
            Some(pathway_id) => u32::from(snapshot.pathway_percent(pathway_id) >= 100.0),
            None => snapshot.pathways_completed,
        },
        RequirementKind::PathwaysStarted => snapshot.pathways_started,
        RequirementKind::ModulesComplete => snapshot.modules_completed,
        RequirementKind::PerfectScore => snapshot.perfect_scores,
    }
}

/// An achievement definition paired with the learner's unlock state.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EvaluatedAchievement {
    /// The static definition
    pub def: AchievementDef,

    /// The learner's unlock state
    pub status: AchievementStatus,
}

/// Progress toward one not-necessarily-unlocked achievement.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AchievementProgress {
    /// Achievement definition id
    pub achievement_id: String,

    /// Current counter value
    pub current_value: u32,

    /// Counter value needed to unlock
    pub target_value: u32,

    /// Progress percentage, clamped to 100
    pub percentage: u32,
}

/// Aggregate achievement statistics, derived rather than stored.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UserAchievementStats {
    /// Sum of points over unlocked achievements
    pub total_points: u32,

    /// Number of unlocked achievements
    pub unlocked_count: usize,

    /// Number of achievements in the table
    pub total_count: usize,

    /// Unlocked share, 0-100
    pub completion_percentage: f32,

    /// The 3 most recently unlocked achievements, newest first
    pub recent_unlocks: Vec<AchievementDef>,
}

/// Evaluates the achievement table against progress snapshots and persists
/// unlock state.
pub struct AchievementEngine<S: Storage> {
    storage: S,
    catalog: Vec<AchievementDef>,
}

impl<S: Storage> AchievementEngine<S> {
    /// Create an engine over a storage backend and a rule table.
    pub fn new(storage: S, catalog: Vec<AchievementDef>) -> Self {
        Self { storage, catalog }
    }

    /// The rule table.
    pub fn catalog(&self) -> &[AchievementDef] {
        &self.catalog
    }

    /// Evaluate every rule against a snapshot.
    ///
    /// Idempotent and total: an achievement unlocks the first time its
    /// requirement is met and `unlocked_at` is stamped exactly once; later
    /// evaluations leave it untouched. Unlocks never revert on their own,
    /// only through [`AchievementEngine::reset`].
    pub async fn evaluate(
        &mut self,
        snapshot: &ProgressSnapshot,
    ) -> Result<Vec<EvaluatedAchievement>> {
        let user_id = snapshot.user_id;
        let existing = self.storage.list_achievement_statuses(user_id).await?;
        let by_id: std::collections::HashMap<_, _> = existing
            .into_iter()
            .map(|s| (s.achievement_id.clone(), s))
            .collect();

        let mut evaluated = Vec::with_capacity(self.catalog.len());
        for def in &self.catalog {
            let prior = by_id.get(&def.id);
            let status = match prior {
                Some(status) if status.unlocked => status.clone(),
                _ => {
                    if requirement_met(&def.requirement, snapshot) {
                        let status = AchievementStatus {
                            achievement_id: def.id.clone(),
                            user_id,
                            unlocked: true,
                            unlocked_at: Some(chrono::Utc::now()),
                        };
                        self.storage.save_achievement_status(&status).await?;
                        tracing::info!("Achievement unlocked: {} ({})", def.title, def.id);
                        status
                    } else {
                        AchievementStatus::locked(user_id, def.id.clone())
                    }
                }
            };
            evaluated.push(EvaluatedAchievement {
                def: def.clone(),
                status,
            });
        }
        Ok(evaluated)
    }

    /// Clear a learner's unlock state for one achievement, allowing it to
    /// be earned (and re-stamped) again.
    pub async fn reset(&mut self, user_id: UserId, achievement_id: &str) -> Result<()> {
        let status = AchievementStatus::locked(user_id, achievement_id);
        self.storage.save_achievement_status(&status).await?;
        Ok(())
    }

    /// Derive aggregate statistics from an evaluation.
    pub fn stats(evaluated: &[EvaluatedAchievement]) -> UserAchievementStats {
        let unlocked: Vec<_> = evaluated.iter().filter(|e| e.status.unlocked).collect();
        let total_points = unlocked.iter().map(|e| e.def.points).sum();
        let unlocked_count = unlocked.len();
        let total_count = evaluated.len();

        let mut by_recency = unlocked;
        by_recency.sort_by(|a, b| b.status.unlocked_at.cmp(&a.status.unlocked_at));
        let recent_unlocks = by_recency
            .iter()
            .take(3)
            .map(|e| e.def.clone())
            .collect();

        UserAchievementStats {
            total_points,
            unlocked_count,
            total_count,
            completion_percentage: if total_count > 0 {
                (unlocked_count as f32 / total_count as f32) * 100.0
            } else {
                0.0
            },
            recent_unlocks,
        }
    }

    /// Progress toward each achievement. Entries with no progress at all
    /// are omitted unless already unlocked.
    pub fn progress_toward(
        &self,
        snapshot: &ProgressSnapshot,
        evaluated: &[EvaluatedAchievement],
    ) -> Vec<AchievementProgress> {
        evaluated
            .iter()
            .filter_map(|e| {
                let current = current_value(&e.def.requirement, snapshot);
                let target = e.def.requirement.value.max(1);
                let percentage = ((current as f32 / target as f32) * 100.0).min(100.0) as u32;
                if percentage > 0 || e.status.unlocked {
                    Some(AchievementProgress {
                        achievement_id: e.def.id.clone(),
                        current_value: current,
                        target_value: e.def.requirement.value,
                        percentage,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}
