//! Traverse CLI - learner progress engine for pathway-based learning.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::Level;
use traverse_achievements::{builtin_catalog, AchievementEngine};
use traverse_content::ContentLibrary;
use traverse_core::{Grade, ModuleId, ResourceId, UploadFile, UserId};
use traverse_gateway::{FsBlobStore, NotificationChannel, ReviewNotifier};
use traverse_progress::{
    ModuleGate, ProgressAggregator, ResourceTracker, ReviewVerdict, SubmissionTracker,
    SubmissionVerdict,
};
use traverse_storage::JsonStorage;

#[derive(Parser)]
#[command(name = "traverse")]
#[command(about = "Learner progress engine for pathway-based learning", long_about = None)]
struct Cli {
    /// Content directory holding pathway definition JSON files
    #[arg(long, default_value = "content")]
    content: std::path::PathBuf,

    /// Data directory
    #[arg(long, default_value = ".traverse")]
    data: std::path::PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List pathways with progress
    Pathways,
    /// Start a resource
    Start {
        /// Resource ID
        resource: String,
    },
    /// Record partial progress on a resource
    Progress {
        /// Resource ID
        resource: String,
        /// Progress percentage (0-100)
        #[arg(long)]
        percent: f32,
        /// Minutes spent since the last update
        #[arg(long, default_value = "0")]
        minutes: u32,
    },
    /// Mark a resource completed
    Complete {
        /// Resource ID
        resource: String,
    },
    /// Undo completion of a video or article
    Uncomplete {
        /// Resource ID
        resource: String,
    },
    /// Record a scored quiz attempt
    Quiz {
        /// Resource ID
        resource: String,
        /// Score percentage (0-100)
        #[arg(long)]
        score: u8,
    },
    /// Upload a deliverable against an exercise or project
    Upload {
        /// Resource ID
        resource: String,
        /// File to upload
        file: std::path::PathBuf,
        /// MIME type of the file
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
    /// List submissions against a resource, newest first
    Submissions {
        /// Resource ID
        resource: String,
    },
    /// Apply a reviewer decision to a submission
    ReviewSubmission {
        /// Submission ID
        submission: String,
        /// Approve instead of reject
        #[arg(long)]
        approve: bool,
        /// Reviewer name
        #[arg(long, default_value = "reviewer")]
        reviewer: String,
        /// Review comments
        #[arg(long)]
        comments: Option<String>,
    },
    /// Show the derived state of a module
    Module {
        /// Module ID
        module: String,
    },
    /// Submit a module for review
    SubmitModule {
        /// Module ID
        module: String,
    },
    /// Apply a reviewer decision to a pending module review
    ReviewModule {
        /// Module ID
        module: String,
        /// Approve instead of reject
        #[arg(long)]
        approve: bool,
        /// Reviewer name
        #[arg(long, default_value = "reviewer")]
        reviewer: String,
        /// Review comments
        #[arg(long)]
        comments: Option<String>,
    },
    /// Show the aggregate progress snapshot
    Status,
    /// Show achievements and statistics
    Achievements,
}

/// Load the learner identity, creating one on first run.
async fn load_profile(data: &std::path::Path) -> Result<UserId> {
    let path = data.join("profile.json");
    match tokio::fs::read_to_string(&path).await {
        Ok(json) => {
            let profile: serde_json::Value = serde_json::from_str(&json)?;
            let id = profile
                .get("user_id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("malformed profile"))?;
            Ok(id.parse()?)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let user_id = UserId::new();
            tokio::fs::create_dir_all(data).await?;
            let profile = serde_json::json!({ "user_id": user_id.to_string() });
            tokio::fs::write(&path, serde_json::to_string_pretty(&profile)?).await?;
            println!("Created learner profile: {}", user_id);
            Ok(user_id)
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let storage = JsonStorage::new(&cli.data).await?;
    let library = Arc::new(ContentLibrary::load_dir(&cli.content).await?);
    let user_id = load_profile(&cli.data).await?;

    match cli.command {
        Commands::Pathways => {
            let mut aggregator = ProgressAggregator::new(storage, Arc::clone(&library));
            let snapshot = aggregator.aggregate(user_id).await?;
            println!("Pathways ({})", library.pathways().len());
            for meta in library.meta(Some(&snapshot)) {
                let availability = if meta.is_available { "" } else { " (coming soon)" };
                println!(
                    "  {} | {:>5.1}% | {}{}",
                    meta.id, meta.progress, meta.title, availability
                );
            }
        }
        Commands::Start { resource } => {
            let mut tracker = ResourceTracker::new(storage, library);
            let record = tracker.start(user_id, &ResourceId::from(resource.as_str())).await?;
            println!(
                "Started {} ({})",
                record.resource_id,
                record.status.as_str()
            );
        }
        Commands::Progress {
            resource,
            percent,
            minutes,
        } => {
            let mut tracker = ResourceTracker::new(storage, library);
            let record = tracker
                .record_progress(user_id, &ResourceId::from(resource.as_str()), percent, minutes)
                .await?;
            println!(
                "{}: {:.0}% | {} min",
                record.resource_id, record.progress_percentage, record.time_spent_minutes
            );
        }
        Commands::Complete { resource } => {
            let mut tracker = ResourceTracker::new(storage, library);
            let record = tracker
                .complete(user_id, &ResourceId::from(resource.as_str()))
                .await?;
            println!("{}: {}", record.resource_id, record.status.as_str());
        }
        Commands::Uncomplete { resource } => {
            let mut tracker = ResourceTracker::new(storage, library);
            let record = tracker
                .uncomplete(user_id, &ResourceId::from(resource.as_str()))
                .await?;
            println!("{}: {}", record.resource_id, record.status.as_str());
        }
        Commands::Quiz { resource, score } => {
            let mut tracker = ResourceTracker::new(storage, library);
            let attempt = tracker
                .record_quiz_score(user_id, &ResourceId::from(resource.as_str()), score)
                .await?;
            if attempt.passed {
                println!("Passed with {}%", attempt.score);
            } else {
                println!("Scored {}% - below the passing threshold, try again", attempt.score);
            }
        }
        Commands::Upload {
            resource,
            file,
            content_type,
        } => {
            let bytes = tokio::fs::read(&file).await?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let upload = UploadFile {
                size_bytes: bytes.len() as u64,
                name,
                content_type,
                bytes,
            };

            let blobs = Arc::new(FsBlobStore::new(cli.data.join("blobs")).await?);
            let mut tracker = SubmissionTracker::new(storage, blobs, library);
            let submission = tracker
                .upload(user_id, &ResourceId::from(resource.as_str()), upload)
                .await?;
            println!(
                "Uploaded {} ({} bytes) -> {}",
                submission.file_name,
                submission.file_size_bytes,
                submission.id
            );
        }
        Commands::Submissions { resource } => {
            let blobs = Arc::new(FsBlobStore::new(cli.data.join("blobs")).await?);
            let tracker = SubmissionTracker::new(storage, blobs, library);
            let history = tracker
                .history(user_id, &ResourceId::from(resource.as_str()))
                .await?;
            println!("Submissions ({})", history.len());
            for submission in history {
                println!(
                    "  {} | {} | {} | {}",
                    submission.id,
                    submission.status.as_str(),
                    submission.file_name,
                    submission.created_at
                );
                if let Some(comments) = &submission.review_comments {
                    println!("    comments: {}", comments);
                }
            }
        }
        Commands::ReviewSubmission {
            submission,
            approve,
            reviewer,
            comments,
        } => {
            let blobs = Arc::new(FsBlobStore::new(cli.data.join("blobs")).await?);
            let mut tracker = SubmissionTracker::new(storage, blobs, library);
            let verdict = if approve {
                SubmissionVerdict::Approve
            } else {
                SubmissionVerdict::Reject
            };
            let grade = if approve { Grade::Pass } else { Grade::Fail };
            let submission = tracker
                .review(submission.parse()?, verdict, reviewer, comments, Some(grade))
                .await?;
            println!("Submission {}: {}", submission.id, submission.status.as_str());
        }
        Commands::Module { module } => {
            let gate = ModuleGate::new(storage, library);
            let state = gate.state(user_id, &ModuleId::from(module.as_str())).await?;
            println!("Module: {}", state.module_id);
            println!(
                "  Resources: {}/{}",
                state.satisfied_resources, state.total_resources
            );
            println!(
                "  Approval: {}",
                state
                    .approval_status
                    .map(|s| s.as_str())
                    .unwrap_or("not submitted")
            );
            println!("  Completed: {}", state.completed);
            if let Some(comments) = &state.review_comments {
                println!("  Review comments: {}", comments);
            }
        }
        Commands::SubmitModule { module } => {
            let notifier = Arc::new(ReviewNotifier::new(NotificationChannel::Console));
            let mut gate = ModuleGate::new(storage, library).with_notifier(notifier);
            let review = gate
                .submit_for_review(user_id, &ModuleId::from(module.as_str()))
                .await?;
            println!(
                "Module {} submitted for review ({})",
                review.module_id,
                review.approval_status.as_str()
            );
        }
        Commands::ReviewModule {
            module,
            approve,
            reviewer,
            comments,
        } => {
            let mut gate = ModuleGate::new(storage, library);
            let verdict = if approve {
                ReviewVerdict::Approve
            } else {
                ReviewVerdict::Reject
            };
            let review = gate
                .apply_decision(
                    user_id,
                    &ModuleId::from(module.as_str()),
                    verdict,
                    reviewer,
                    comments,
                )
                .await?;
            println!(
                "Module {}: {}",
                review.module_id,
                review.approval_status.as_str()
            );
        }
        Commands::Status => {
            let mut aggregator = ProgressAggregator::new(storage, Arc::clone(&library));
            let snapshot = aggregator.aggregate(user_id).await?;
            println!("Learner {}", snapshot.user_id);
            println!("  Total progress: {:.1}%", snapshot.total_progress);
            println!("  Modules completed: {}", snapshot.modules_completed);
            println!("  Pathways started: {}", snapshot.pathways_started);
            println!("  Pathways completed: {}", snapshot.pathways_completed);
            println!("  Perfect quiz scores: {}", snapshot.perfect_scores);
            for (pathway_id, progress) in &snapshot.pathways {
                let current = progress
                    .current_module
                    .as_ref()
                    .map(|m| format!(" | next: {}", m))
                    .unwrap_or_default();
                println!("  {} | {:>5.1}%{}", pathway_id, progress.progress, current);
            }
        }
        Commands::Achievements => {
            let mut aggregator = ProgressAggregator::new(storage, Arc::clone(&library));
            let snapshot = aggregator.aggregate(user_id).await?;

            // The aggregator consumed the storage; reopen for the engine.
            let storage = JsonStorage::new(&cli.data).await?;
            let mut engine = AchievementEngine::new(storage, builtin_catalog());
            let evaluated = engine.evaluate(&snapshot).await?;
            let stats = AchievementEngine::<JsonStorage>::stats(&evaluated);

            println!(
                "Achievements: {}/{} unlocked | {} points",
                stats.unlocked_count, stats.total_count, stats.total_points
            );
            for entry in &evaluated {
                let marker = if entry.status.unlocked { "x" } else { " " };
                println!(
                    "  [{}] {} - {} ({} pts)",
                    marker, entry.def.title, entry.def.description, entry.def.points
                );
            }
            if !stats.recent_unlocks.is_empty() {
                println!("Recent unlocks:");
                for def in &stats.recent_unlocks {
                    println!("  {}", def.title);
                }
            }
        }
    }

    Ok(())
}
