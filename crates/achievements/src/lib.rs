//! Achievements for Traverse.
//!
//! A static rule table evaluated against progress snapshots, with persisted
//! unlock state and derived statistics.

#![warn(missing_docs)]

pub mod catalog;
pub mod engine;

pub use catalog::builtin_catalog;
pub use engine::{
    requirement_met, AchievementEngine, AchievementProgress, EvaluatedAchievement,
    UserAchievementStats,
};

/// Error type for achievement operations.
pub type Result<T> = std::result::Result<T, AchievementError>;

/// Errors raised by the achievement engine.
#[derive(Debug, thiserror::Error)]
pub enum AchievementError {
    /// Persistence failure.
    #[error(transparent)]
    Storage(#[from] traverse_storage::StorageError),
}
