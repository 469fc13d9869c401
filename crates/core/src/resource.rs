//! Resource model - the atomic learning unit.

use serde::{Deserialize, Serialize};
use crate::id::ResourceId;

/// Default quiz passing threshold, in percent.
pub const DEFAULT_PASSING_SCORE: u8 = 80;

/// An atomic learning item inside a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier (content slug)
    pub id: ResourceId,

    /// What kind of resource this is
    #[serde(rename = "type")]
    pub kind: ResourceKind,

    /// Display title
    pub title: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Optional link to the content itself
    #[serde(default)]
    pub url: Option<String>,

    /// Expected duration in minutes
    #[serde(default)]
    pub duration_minutes: Option<u32>,

    /// Position within the module
    #[serde(default)]
    pub order_index: u32,

    /// Upload requirements for exercises and projects
    #[serde(default)]
    pub upload: UploadPolicy,

    /// Quiz scoring policy, present only for quizzes
    #[serde(default)]
    pub quiz: Option<QuizPolicy>,
}

impl Resource {
    /// Passing threshold for this resource, falling back to the default.
    pub fn passing_score(&self) -> u8 {
        self.quiz
            .as_ref()
            .map(|q| q.passing_score)
            .unwrap_or(DEFAULT_PASSING_SCORE)
    }
}

/// The kind of a learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Watchable video content
    Video,
    /// Readable article content
    Article,
    /// Hands-on exercise with an uploaded deliverable
    Exercise,
    /// Larger project with an uploaded deliverable
    Project,
    /// Scored quiz
    Quiz,
}

impl ResourceKind {
    /// Whether completion of this kind may be undone by the learner.
    ///
    /// Exercises, projects and quizzes keep their completion for audit
    /// integrity once recorded.
    pub fn is_reversible(&self) -> bool {
        matches!(self, ResourceKind::Video | ResourceKind::Article)
    }

    /// Whether completing this kind requires an uploaded submission.
    pub fn requires_submission(&self) -> bool {
        matches!(self, ResourceKind::Exercise | ResourceKind::Project)
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Video => "video",
            ResourceKind::Article => "article",
            ResourceKind::Exercise => "exercise",
            ResourceKind::Project => "project",
            ResourceKind::Quiz => "quiz",
        }
    }
}

/// Upload constraints for resources that accept file submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Whether an upload is required at all
    pub requires_upload: bool,

    /// Accepted MIME types; entries like `image/*` match a whole family.
    /// Empty means any type is accepted.
    pub accepted_file_types: Vec<String>,

    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Whether a new submission may replace an earlier one
    pub allow_resubmission: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            requires_upload: false,
            accepted_file_types: Vec::new(),
            max_file_size_mb: 50,
            allow_resubmission: true,
        }
    }
}

/// Scoring policy for quiz resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizPolicy {
    /// Minimum score (percent) counted as a pass
    pub passing_score: u8,
}

impl Default for QuizPolicy {
    fn default() -> Self {
        Self {
            passing_score: DEFAULT_PASSING_SCORE,
        }
    }
}
