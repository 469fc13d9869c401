//! Uploaded artifact submissions and their review lifecycle.

use serde::{Deserialize, Serialize};
use crate::id::{ResourceId, SubmissionId, UserId};
use crate::Time;

/// Opaque reference into the blob store.
///
/// The engine never interprets this value; it only requires that a
/// successful upload yields a stable reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRef(pub String);

impl std::fmt::Display for StorageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A file handed to the submission tracker for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name
    pub name: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// MIME type, e.g. `application/pdf`
    pub content_type: String,

    /// File contents
    pub bytes: Vec<u8>,
}

/// One uploaded artifact attempt against a resource.
///
/// Multiple submissions may exist per resource; they are ordered
/// newest-first and older ones are kept as history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSubmission {
    /// Unique identifier
    pub id: SubmissionId,

    /// Owning learner
    pub user_id: UserId,

    /// Resource the artifact was submitted against
    pub resource_id: ResourceId,

    /// Original file name
    pub file_name: String,

    /// Size in bytes
    pub file_size_bytes: u64,

    /// MIME type
    pub file_type: String,

    /// Blob store reference; present once the transfer succeeded
    pub storage_ref: Option<StorageRef>,

    /// Current lifecycle status
    pub status: SubmissionStatus,

    /// Reviewer grade, set with the review decision
    pub grade: Option<Grade>,

    /// Reviewer identity
    pub reviewed_by: Option<String>,

    /// When the review decision was made
    pub reviewed_at: Option<Time>,

    /// Reviewer feedback
    pub review_comments: Option<String>,

    /// Creation timestamp; ordering key for resubmission history
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl ResourceSubmission {
    /// Create a new record in `uploading`, before any transfer happens.
    pub fn begin(user_id: UserId, resource_id: ResourceId, file: &UploadFile) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: SubmissionId::new(),
            user_id,
            resource_id,
            file_name: file.name.clone(),
            file_size_bytes: file.size_bytes,
            file_type: file.content_type.clone(),
            storage_ref: None,
            status: SubmissionStatus::Uploading,
            grade: None,
            reviewed_by: None,
            reviewed_at: None,
            review_comments: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lifecycle status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Transfer to the blob store is in flight
    Uploading,
    /// Artifact stored, awaiting review
    Uploaded,
    /// Picked up by a reviewer or an automated pipeline
    Processing,
    /// Accepted by a reviewer
    Approved,
    /// Returned by a reviewer; kept as history
    Rejected,
    /// Transfer failed; no artifact was stored
    Failed,
}

impl SubmissionStatus {
    /// Whether a reviewer may act on a submission in this status.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, SubmissionStatus::Uploaded | SubmissionStatus::Processing)
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Approved | SubmissionStatus::Rejected | SubmissionStatus::Failed
        )
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Uploading => "uploading",
            SubmissionStatus::Uploaded => "uploaded",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Failed => "failed",
        }
    }
}

/// Reviewer grade on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// Meets the bar
    Pass,
    /// Does not meet the bar
    Fail,
}
