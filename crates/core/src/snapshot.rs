//! Aggregate progress snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::id::{ModuleId, PathwayId, UserId};
use crate::Time;

/// Aggregate progress counters for one learner.
///
/// This is the sole input to the pathway unlock calculator and the
/// achievement rule engine: both are pure functions of a snapshot plus
/// static content tables, so re-running them against a refreshed snapshot
/// is always safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Owning learner
    pub user_id: UserId,

    /// When the snapshot was aggregated
    pub taken_at: Time,

    /// Mean progress across all pathways, 0-100
    pub total_progress: f32,

    /// Modules completed across all pathways
    pub modules_completed: u32,

    /// Pathways with any progress at all
    pub pathways_started: u32,

    /// Pathways at 100%
    pub pathways_completed: u32,

    /// Distinct quiz resources with a perfect-score attempt
    pub perfect_scores: u32,

    /// Per-pathway progress, keyed by pathway id
    pub pathways: HashMap<PathwayId, PathwayProgress>,
}

impl ProgressSnapshot {
    /// An empty snapshot for a learner with no recorded progress.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            taken_at: chrono::Utc::now(),
            total_progress: 0.0,
            modules_completed: 0,
            pathways_started: 0,
            pathways_completed: 0,
            perfect_scores: 0,
            pathways: HashMap::new(),
        }
    }

    /// Per-pathway progress, if the learner has touched the pathway.
    pub fn pathway(&self, id: &PathwayId) -> Option<&PathwayProgress> {
        self.pathways.get(id)
    }

    /// Stored progress percentage for a pathway, defaulting to zero.
    pub fn pathway_percent(&self, id: &PathwayId) -> f32 {
        self.pathways.get(id).map(|p| p.progress).unwrap_or(0.0)
    }
}

/// Progress of one learner within one pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayProgress {
    /// Percentage of modules completed, 0-100
    pub progress: f32,

    /// Ids of completed modules, in pathway order
    pub completed_modules: Vec<ModuleId>,

    /// The module the learner should work on next, if any remains
    pub current_module: Option<ModuleId>,

    /// Last interaction with any resource in the pathway
    pub last_accessed: Option<Time>,
}

impl PathwayProgress {
    /// Whether the pathway is fully completed.
    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }

    /// Whether the learner has started the pathway.
    pub fn is_started(&self) -> bool {
        self.progress > 0.0 || !self.completed_modules.is_empty()
    }
}
