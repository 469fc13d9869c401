//! Traverse core data models.
//!
//! This crate defines the fundamental data structures that power the
//! learner-progress engine: content tables, per-learner lifecycle records,
//! and the aggregate snapshot that derivations consume.

#![warn(missing_docs)]

// Core identities
mod id;

// Content tables (read-only, editorially authored)
mod pathway;
mod module;
mod resource;

// Per-learner lifecycle records
mod completion;
mod submission;
mod review;
mod quiz;

// Achievements and aggregate progress
mod achievement;
mod snapshot;

// Re-exports
pub use id::*;

// Content
pub use pathway::{Pathway, PathwayMeta, Level};
pub use module::{Module, Difficulty, ApprovalStatus};
pub use resource::{Resource, ResourceKind, UploadPolicy, QuizPolicy, DEFAULT_PASSING_SCORE};

// Learner records
pub use completion::{ResourceCompletion, CompletionStatus};
pub use submission::{ResourceSubmission, SubmissionStatus, Grade, StorageRef, UploadFile};
pub use review::{ModuleReview, ReviewDecision};
pub use quiz::QuizAttempt;

// Achievements & snapshot
pub use achievement::{
    AchievementDef, AchievementStatus, Requirement, RequirementKind, Rarity,
    AchievementCategory,
};
pub use snapshot::{ProgressSnapshot, PathwayProgress};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
