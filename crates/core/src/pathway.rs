//! Pathway model - a named curriculum track.

use serde::{Deserialize, Serialize};
use crate::id::PathwayId;
use crate::module::Module;

/// A curriculum track composed of ordered modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pathway {
    /// Unique identifier (content slug)
    pub id: PathwayId,

    /// URL slug; usually identical to the id
    pub slug: String,

    /// Full display title
    pub title: String,

    /// Abbreviated title for dense layouts
    #[serde(default)]
    pub short_title: String,

    /// Instructor name
    #[serde(default)]
    pub instructor: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Target audience level
    #[serde(default)]
    pub level: Level,

    /// Prerequisite knowledge
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// What the learner will be able to do afterwards
    #[serde(default)]
    pub learning_outcomes: Vec<String>,

    /// Tools used along the track
    #[serde(default)]
    pub tools: Vec<String>,

    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Ordered modules
    pub modules: Vec<Module>,

    /// Editorial flag; unavailable pathways are listed but not enrollable
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

impl Pathway {
    /// Look up a module by id.
    pub fn module(&self, id: &crate::ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }

    /// Position of a module within the pathway sequence.
    pub fn module_index(&self, id: &crate::ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| &m.id == id)
    }
}

/// Target audience level of a pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Suitable for newcomers
    #[default]
    Beginner,
    /// Assumes prior exposure
    Intermediate,
    /// Assumes solid command of prerequisites
    Advanced,
    /// Mixed-level track
    AllLevels,
}

/// Lightweight pathway projection for dashboard listings: content metadata
/// merged with the learner's stored progress percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayMeta {
    /// Pathway identifier
    pub id: PathwayId,

    /// URL slug
    pub slug: String,

    /// Full display title
    pub title: String,

    /// Abbreviated title
    pub short_title: String,

    /// Instructor name
    pub instructor: String,

    /// Stored progress percentage, 0-100
    pub progress: f32,

    /// Editorial availability flag
    pub is_available: bool,
}
