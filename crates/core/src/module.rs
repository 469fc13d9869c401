//! Module model - an ordered, gradeable unit inside a pathway.

use serde::{Deserialize, Serialize};
use crate::id::ModuleId;
use crate::resource::Resource;

/// An ordered unit of a pathway, composed of resources.
///
/// A module's per-learner completion is never stored on the content table;
/// it is derived by the module gate from the learner's completion and
/// submission records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Unique identifier (content slug)
    pub id: ModuleId,

    /// Display title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Editorial duration label, e.g. "2 weeks"
    #[serde(default)]
    pub duration: Option<String>,

    /// Difficulty rating
    #[serde(default)]
    pub difficulty: Difficulty,

    /// Topics covered
    #[serde(default)]
    pub topics: Vec<String>,

    /// Ordered learning resources
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Editorial flag for modules not yet released
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

impl Module {
    /// Look up a resource by id.
    pub fn resource(&self, id: &crate::ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id == id)
    }
}

/// Editorial difficulty rating of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Suitable for newcomers
    #[default]
    Beginner,
    /// Assumes prior exposure
    Intermediate,
    /// Assumes solid command of prerequisites
    Advanced,
}

/// Review outcome of a submitted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Submitted, awaiting a reviewer decision
    Pending,
    /// Accepted by a reviewer; the module counts as completed
    Approved,
    /// Returned by a reviewer; the module may be re-submitted
    Rejected,
}

impl ApprovalStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}
