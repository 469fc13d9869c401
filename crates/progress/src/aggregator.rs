//! Snapshot aggregation.
//!
//! Folds the learner's stored records into the aggregate counters that the
//! unlock calculator and the achievement engine consume. Aggregation is a
//! pure function of the stored records; re-running it only overwrites the
//! cached derived view, so it is always safe against a refreshed store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use traverse_content::ContentLibrary;
use traverse_core::{
    ApprovalStatus, PathwayProgress, ProgressSnapshot, ResourceId, UserId,
};
use traverse_storage::Storage;

use crate::unlock::unlock;
use crate::Result;

/// Computes and caches aggregate progress snapshots.
pub struct ProgressAggregator<S: Storage> {
    storage: S,
    library: Arc<ContentLibrary>,
}

impl<S: Storage> ProgressAggregator<S> {
    /// Create an aggregator over a storage backend and content tables.
    pub fn new(storage: S, library: Arc<ContentLibrary>) -> Self {
        Self { storage, library }
    }

    /// Access the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The cached snapshot from the last aggregation, if any.
    pub async fn cached(&self, user_id: UserId) -> Result<Option<ProgressSnapshot>> {
        Ok(self.storage.load_snapshot(user_id).await?)
    }

    /// Recompute the snapshot from stored records and overwrite the cache.
    ///
    /// The store is the single source of truth: whatever a client showed
    /// optimistically is superseded by what this returns.
    pub async fn aggregate(&mut self, user_id: UserId) -> Result<ProgressSnapshot> {
        let completions = self.storage.list_completions(user_id).await?;
        let reviews = self.storage.list_reviews(user_id).await?;
        let attempts = self.storage.list_all_attempts(user_id).await?;

        let approved: HashSet<_> = reviews
            .iter()
            .filter(|r| r.approval_status == ApprovalStatus::Approved)
            .map(|r| r.module_id.clone())
            .collect();

        let mut pathways = HashMap::new();
        let mut total_modules_completed = 0u32;
        let mut progress_sum = 0.0f32;
        let mut pathways_completed = 0u32;

        for pathway in self.library.pathways() {
            let completed_flags: Vec<bool> = pathway
                .modules
                .iter()
                .map(|m| approved.contains(&m.id))
                .collect();
            let completed_modules: Vec<_> = pathway
                .modules
                .iter()
                .filter(|m| approved.contains(&m.id))
                .map(|m| m.id.clone())
                .collect();

            let total = pathway.modules.len();
            let progress = if total > 0 {
                (completed_modules.len() as f32 / total as f32) * 100.0
            } else {
                0.0
            };

            total_modules_completed += completed_modules.len() as u32;
            progress_sum += progress;
            if total > 0 && progress >= 100.0 {
                pathways_completed += 1;
            }

            let last_accessed = completions
                .iter()
                .filter(|c| c.pathway_id == pathway.id)
                .map(|c| c.last_accessed_at)
                .max();

            // Only pathways the learner has touched get a map entry.
            let touched = last_accessed.is_some() || !completed_modules.is_empty();
            if touched {
                let state = unlock(&completed_flags, progress);
                let current_module = state
                    .current_module
                    .map(|index| pathway.modules[index].id.clone());
                pathways.insert(
                    pathway.id.clone(),
                    PathwayProgress {
                        progress,
                        completed_modules,
                        current_module,
                        last_accessed,
                    },
                );
            }
        }

        let pathway_count = self.library.pathways().len();
        let total_progress = if pathway_count > 0 {
            progress_sum / pathway_count as f32
        } else {
            0.0
        };

        let perfect_quizzes: HashSet<&ResourceId> = attempts
            .iter()
            .filter(|a| a.is_perfect())
            .map(|a| &a.resource_id)
            .collect();

        let snapshot = ProgressSnapshot {
            user_id,
            taken_at: chrono::Utc::now(),
            total_progress,
            modules_completed: total_modules_completed,
            pathways_started: pathways.len() as u32,
            pathways_completed,
            perfect_scores: perfect_quizzes.len() as u32,
            pathways,
        };

        self.storage.save_snapshot(&snapshot).await?;
        tracing::debug!(
            "Aggregated snapshot for learner {}: {:.1}% total, {} modules",
            user_id,
            snapshot.total_progress,
            snapshot.modules_completed
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traverse_core::{
        Module, ModuleId, ModuleReview, Pathway, PathwayId, QuizAttempt, Resource,
        ResourceCompletion, ResourceKind,
    };
    use traverse_storage::MemoryStorage;

    fn resource(id: &str, kind: ResourceKind) -> Resource {
        Resource {
            id: ResourceId::from(id),
            kind,
            title: id.to_string(),
            description: None,
            url: None,
            duration_minutes: None,
            order_index: 0,
            upload: Default::default(),
            quiz: None,
        }
    }

    fn module(id: &str, resource_ids: &[&str]) -> Module {
        Module {
            id: ModuleId::from(id),
            title: id.to_string(),
            description: String::new(),
            duration: None,
            difficulty: Default::default(),
            topics: vec![],
            resources: resource_ids
                .iter()
                .map(|r| resource(r, ResourceKind::Video))
                .collect(),
            is_available: true,
        }
    }

    fn pathway(id: &str, modules: Vec<Module>) -> Pathway {
        Pathway {
            id: PathwayId::from(id),
            slug: id.to_string(),
            title: id.to_string(),
            short_title: id.to_string(),
            instructor: String::new(),
            description: String::new(),
            level: Default::default(),
            prerequisites: vec![],
            learning_outcomes: vec![],
            tools: vec![],
            tags: vec![],
            modules,
            is_available: true,
        }
    }

    fn library() -> Arc<ContentLibrary> {
        Arc::new(
            ContentLibrary::new(vec![
                pathway(
                    "mlops",
                    vec![
                        module("mlops-1", &["a", "b"]),
                        module("mlops-2", &["c"]),
                    ],
                ),
                pathway("devops", vec![module("devops-1", &["d"])]),
            ])
            .unwrap(),
        )
    }

    async fn approve(storage: &mut MemoryStorage, user: UserId, pathway_id: &str, module_id: &str) {
        let mut review = ModuleReview::submit(
            user,
            ModuleId::from(module_id),
            PathwayId::from(pathway_id),
        );
        review.decide(ApprovalStatus::Approved, "reviewer-a", None);
        storage.save_review(&review).await.unwrap();
    }

    #[tokio::test]
    async fn untouched_learner_aggregates_to_zero() {
        let mut aggregator = ProgressAggregator::new(MemoryStorage::new(), library());
        let snapshot = aggregator.aggregate(UserId::new()).await.unwrap();

        assert_eq!(snapshot.total_progress, 0.0);
        assert_eq!(snapshot.modules_completed, 0);
        assert_eq!(snapshot.pathways_started, 0);
        assert_eq!(snapshot.pathways_completed, 0);
        assert!(snapshot.pathways.is_empty());
    }

    #[tokio::test]
    async fn pathway_progress_is_completed_module_percentage() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        approve(&mut storage, user, "mlops", "mlops-1").await;
        let mut aggregator = ProgressAggregator::new(storage, library());

        let snapshot = aggregator.aggregate(user).await.unwrap();
        let mlops = snapshot.pathway(&PathwayId::from("mlops")).unwrap();
        assert_eq!(mlops.progress, 50.0);
        assert_eq!(mlops.completed_modules, vec![ModuleId::from("mlops-1")]);
        assert_eq!(mlops.current_module, Some(ModuleId::from("mlops-2")));

        assert_eq!(snapshot.modules_completed, 1);
        assert_eq!(snapshot.pathways_started, 1);
        assert_eq!(snapshot.pathways_completed, 0);
        // Mean over both pathways: (50 + 0) / 2.
        assert_eq!(snapshot.total_progress, 25.0);
    }

    #[tokio::test]
    async fn full_pathway_counts_as_completed() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        approve(&mut storage, user, "mlops", "mlops-1").await;
        approve(&mut storage, user, "mlops", "mlops-2").await;
        let mut aggregator = ProgressAggregator::new(storage, library());

        let snapshot = aggregator.aggregate(user).await.unwrap();
        assert_eq!(snapshot.pathways_completed, 1);
        let mlops = snapshot.pathway(&PathwayId::from("mlops")).unwrap();
        assert!(mlops.is_complete());
        assert_eq!(mlops.current_module, None);
    }

    #[tokio::test]
    async fn in_progress_resources_mark_a_pathway_started() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        let record = ResourceCompletion::start(
            user,
            ResourceId::from("d"),
            ModuleId::from("devops-1"),
            PathwayId::from("devops"),
            false,
        );
        storage.save_completion(&record).await.unwrap();
        let mut aggregator = ProgressAggregator::new(storage, library());

        let snapshot = aggregator.aggregate(user).await.unwrap();
        assert_eq!(snapshot.pathways_started, 1);
        let devops = snapshot.pathway(&PathwayId::from("devops")).unwrap();
        assert_eq!(devops.progress, 0.0);
        assert!(devops.last_accessed.is_some());
    }

    #[tokio::test]
    async fn perfect_scores_count_distinct_quizzes() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        let quiz_a = ResourceId::from("quiz-a");
        let quiz_b = ResourceId::from("quiz-b");

        storage
            .save_attempt(&QuizAttempt::record(user, quiz_a.clone(), 100, 80))
            .await
            .unwrap();
        storage
            .save_attempt(&QuizAttempt::record(user, quiz_a, 100, 80))
            .await
            .unwrap();
        storage
            .save_attempt(&QuizAttempt::record(user, quiz_b, 90, 80))
            .await
            .unwrap();
        let mut aggregator = ProgressAggregator::new(storage, library());

        let snapshot = aggregator.aggregate(user).await.unwrap();
        assert_eq!(snapshot.perfect_scores, 1);
    }

    #[tokio::test]
    async fn aggregation_is_reproducible_and_overwrites_the_cache() {
        let mut storage = MemoryStorage::new();
        let user = UserId::new();
        approve(&mut storage, user, "mlops", "mlops-1").await;
        let mut aggregator = ProgressAggregator::new(storage, library());

        let first = aggregator.aggregate(user).await.unwrap();
        let second = aggregator.aggregate(user).await.unwrap();

        assert_eq!(first.total_progress, second.total_progress);
        assert_eq!(first.modules_completed, second.modules_completed);
        assert_eq!(first.pathways_started, second.pathways_started);
        assert_eq!(first.pathways_completed, second.pathways_completed);
        assert_eq!(first.perfect_scores, second.perfect_scores);
        assert_eq!(first.pathways, second.pathways);

        let cached = aggregator.cached(user).await.unwrap().unwrap();
        assert_eq!(cached.taken_at, second.taken_at);
    }
}
