//! Submission tracking service: validate, upload, review.

use std::sync::Arc;
use traverse_content::ContentLibrary;
use traverse_core::{
    CompletionStatus, Grade, ResourceCompletion, ResourceId, ResourceSubmission, SubmissionId,
    SubmissionStatus, UploadFile, UploadPolicy, UserId,
};
use traverse_gateway::{BlobStore, SignedUrl};
use traverse_storage::Storage;

use crate::{ProgressError, Result};

/// Reviewer decision on a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionVerdict {
    /// Accept the artifact
    Approve,
    /// Return the artifact; it stays visible as history
    Reject,
}

/// Validate a file against an upload policy without touching the network.
///
/// The error message names the violated constraint so the learner can pick
/// a different file.
pub fn validate_file(file: &UploadFile, policy: &UploadPolicy) -> Result<()> {
    let max_bytes = policy.max_file_size_mb * 1024 * 1024;
    if file.size_bytes > max_bytes {
        return Err(ProgressError::InvalidFile(format!(
            "file size exceeds {}MB limit",
            policy.max_file_size_mb
        )));
    }

    if !policy.accepted_file_types.is_empty() {
        let accepted = policy.accepted_file_types.iter().any(|accepted| {
            if let Some(family) = accepted.strip_suffix("/*") {
                file.content_type.starts_with(&format!("{}/", family))
            } else {
                &file.content_type == accepted
            }
        });
        if !accepted {
            return Err(ProgressError::InvalidFile(format!(
                "file type {} not accepted; allowed types: {}",
                file.content_type,
                policy.accepted_file_types.join(", ")
            )));
        }
    }

    Ok(())
}

/// Owns the lifecycle of uploaded artifacts and their review outcomes.
pub struct SubmissionTracker<S: Storage> {
    storage: S,
    blobs: Arc<dyn BlobStore>,
    library: Arc<ContentLibrary>,
}

impl<S: Storage> SubmissionTracker<S> {
    /// Create a tracker over storage, a blob store and content tables.
    pub fn new(storage: S, blobs: Arc<dyn BlobStore>, library: Arc<ContentLibrary>) -> Self {
        Self {
            storage,
            blobs,
            library,
        }
    }

    /// Access the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Upload a deliverable against an exercise or project resource.
    ///
    /// Validation happens before any transfer; a rejected file creates no
    /// record at all. A transport failure is recorded as a terminal
    /// `failed` submission and the completion record is left untouched.
    /// Upload never auto-completes the resource.
    pub async fn upload(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
        file: UploadFile,
    ) -> Result<ResourceSubmission> {
        let library = Arc::clone(&self.library);
        let ctx = library
            .find_resource(resource_id)
            .ok_or_else(|| ProgressError::UnknownResource(resource_id.clone()))?;
        if !ctx.resource.kind.requires_submission() && !ctx.resource.upload.requires_upload {
            return Err(ProgressError::UploadNotAccepted(resource_id.clone()));
        }
        let module_id = ctx.module.id.clone();
        let pathway_id = ctx.pathway.id.clone();

        // Failed transfers never stored an artifact and do not count
        // against a single-shot policy.
        let existing = self.storage.list_submissions(user_id, resource_id).await?;
        let has_stored = existing.iter().any(|s| s.storage_ref.is_some());
        if has_stored && !ctx.resource.upload.allow_resubmission {
            return Err(ProgressError::ResubmissionNotAllowed(resource_id.clone()));
        }

        // Fail fast on policy violations; nothing is created or transferred.
        validate_file(&file, &ctx.resource.upload)?;

        let mut submission = ResourceSubmission::begin(user_id, resource_id.clone(), &file);
        match self.blobs.put(&file).await {
            Ok(storage_ref) => {
                submission.storage_ref = Some(storage_ref);
                submission.status = SubmissionStatus::Uploaded;
                submission.updated_at = chrono::Utc::now();
                self.storage.save_submission(&submission).await?;

                self.touch_completion(user_id, resource_id, module_id, pathway_id)
                    .await?;
                tracing::info!(
                    "Uploaded {} against resource {} for learner {}",
                    submission.file_name,
                    resource_id,
                    user_id
                );
                Ok(submission)
            }
            Err(e) => {
                submission.status = SubmissionStatus::Failed;
                submission.updated_at = chrono::Utc::now();
                self.storage.save_submission(&submission).await?;
                tracing::warn!(
                    "Upload of {} against resource {} failed: {}",
                    submission.file_name,
                    resource_id,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Move the completion record along on a successful upload: bump the
    /// submission count and mark the record `submitted` unless a review
    /// already advanced it further.
    async fn touch_completion(
        &mut self,
        user_id: UserId,
        resource_id: &ResourceId,
        module_id: traverse_core::ModuleId,
        pathway_id: traverse_core::PathwayId,
    ) -> Result<()> {
        let mut record = match self.storage.load_completion(user_id, resource_id).await? {
            Some(record) => record,
            None => ResourceCompletion::start(
                user_id,
                resource_id.clone(),
                module_id,
                pathway_id,
                true,
            ),
        };
        record.submission_count += 1;
        if record.status != CompletionStatus::Reviewed {
            record.status = CompletionStatus::Submitted;
        }
        record.last_accessed_at = chrono::Utc::now();
        self.storage.save_completion(&record).await?;
        Ok(())
    }

    /// The authoritative submission for gating decisions: newest first.
    pub async fn latest(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Option<ResourceSubmission>> {
        let submissions = self.storage.list_submissions(user_id, resource_id).await?;
        Ok(submissions.into_iter().next())
    }

    /// Full submission history, newest first. Nothing is ever deleted.
    pub async fn history(
        &self,
        user_id: UserId,
        resource_id: &ResourceId,
    ) -> Result<Vec<ResourceSubmission>> {
        Ok(self.storage.list_submissions(user_id, resource_id).await?)
    }

    /// Apply an external reviewer's decision to a submission.
    pub async fn review(
        &mut self,
        submission_id: SubmissionId,
        verdict: SubmissionVerdict,
        reviewed_by: impl Into<String>,
        comments: Option<String>,
        grade: Option<Grade>,
    ) -> Result<ResourceSubmission> {
        let mut submission = self
            .storage
            .load_submission(submission_id)
            .await?
            .ok_or(ProgressError::UnknownSubmission(submission_id))?;

        if !submission.status.is_reviewable() {
            return Err(ProgressError::NotReviewable(submission_id));
        }

        submission.status = match verdict {
            SubmissionVerdict::Approve => SubmissionStatus::Approved,
            SubmissionVerdict::Reject => SubmissionStatus::Rejected,
        };
        submission.grade = grade;
        submission.reviewed_by = Some(reviewed_by.into());
        submission.reviewed_at = Some(chrono::Utc::now());
        submission.review_comments = comments;
        submission.updated_at = chrono::Utc::now();
        self.storage.save_submission(&submission).await?;

        // The resource record reflects that a review decision exists.
        if let Some(mut record) = self
            .storage
            .load_completion(submission.user_id, &submission.resource_id)
            .await?
        {
            record.status = CompletionStatus::Reviewed;
            record.last_accessed_at = chrono::Utc::now();
            self.storage.save_completion(&record).await?;
        }

        tracing::info!(
            "Submission {} {} by {}",
            submission_id,
            submission.status.as_str(),
            submission.reviewed_by.as_deref().unwrap_or("unknown")
        );
        Ok(submission)
    }

    /// Signed download URL for a stored artifact.
    pub async fn download_url(&self, submission_id: SubmissionId) -> Result<SignedUrl> {
        let submission = self
            .storage
            .load_submission(submission_id)
            .await?
            .ok_or(ProgressError::UnknownSubmission(submission_id))?;
        let storage_ref = submission
            .storage_ref
            .as_ref()
            .ok_or(ProgressError::NotReviewable(submission_id))?;
        Ok(self.blobs.signed_url(storage_ref).await?)
    }
}
