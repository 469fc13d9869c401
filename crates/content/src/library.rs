//! Read-only content tables.
//!
//! Pathway definitions are editorially authored JSON documents. The engine
//! never mutates them; per-learner state lives entirely in storage records.

use std::path::Path;
use tokio::fs;
use traverse_core::{
    Module, ModuleId, Pathway, PathwayId, PathwayMeta, ProgressSnapshot, Resource, ResourceId,
};

/// Error type for content loading.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Errors that can occur while loading content tables.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed pathway definition
    #[error("invalid pathway definition in {path}: {source}")]
    Invalid {
        /// Offending file
        path: String,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Two definitions claim the same pathway id
    #[error("duplicate pathway id: {0}")]
    Duplicate(PathwayId),
}

/// A resource resolved to its position in the content tree.
#[derive(Debug, Clone, Copy)]
pub struct ResourceContext<'a> {
    /// The pathway containing the resource
    pub pathway: &'a Pathway,
    /// The module containing the resource
    pub module: &'a Module,
    /// The resource itself
    pub resource: &'a Resource,
}

/// In-memory catalog of all pathway definitions.
pub struct ContentLibrary {
    pathways: Vec<Pathway>,
}

impl ContentLibrary {
    /// Build a library from already-parsed pathway definitions.
    pub fn new(pathways: Vec<Pathway>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for pathway in &pathways {
            if !seen.insert(pathway.id.clone()) {
                return Err(ContentError::Duplicate(pathway.id.clone()));
            }
        }
        Ok(Self { pathways })
    }

    /// Load every `*.json` pathway definition under a directory.
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut pathways = Vec::new();
        let mut rd = fs::read_dir(dir.as_ref()).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path).await?;
            let pathway: Pathway =
                serde_json::from_str(&json).map_err(|source| ContentError::Invalid {
                    path: path.display().to_string(),
                    source,
                })?;
            tracing::debug!("Loaded pathway definition: {}", pathway.id);
            pathways.push(pathway);
        }
        // Stable listing order regardless of directory iteration order.
        pathways.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Self::new(pathways)
    }

    /// All pathways, in id order.
    pub fn pathways(&self) -> &[Pathway] {
        &self.pathways
    }

    /// Look up a pathway by id.
    pub fn pathway(&self, id: &PathwayId) -> Option<&Pathway> {
        self.pathways.iter().find(|p| &p.id == id)
    }

    /// Look up a pathway by URL slug.
    pub fn pathway_by_slug(&self, slug: &str) -> Option<&Pathway> {
        self.pathways.iter().find(|p| p.slug == slug)
    }

    /// Whether a pathway slug exists.
    pub fn pathway_exists(&self, slug: &str) -> bool {
        self.pathway_by_slug(slug).is_some()
    }

    /// All pathway slugs.
    pub fn slugs(&self) -> Vec<&str> {
        self.pathways.iter().map(|p| p.slug.as_str()).collect()
    }

    /// Resolve a module to its pathway.
    pub fn find_module(&self, id: &ModuleId) -> Option<(&Pathway, &Module)> {
        self.pathways
            .iter()
            .find_map(|p| p.module(id).map(|m| (p, m)))
    }

    /// Resolve a resource to its module and pathway.
    pub fn find_resource(&self, id: &ResourceId) -> Option<ResourceContext<'_>> {
        for pathway in &self.pathways {
            for module in &pathway.modules {
                if let Some(resource) = module.resource(id) {
                    return Some(ResourceContext {
                        pathway,
                        module,
                        resource,
                    });
                }
            }
        }
        None
    }

    /// Dashboard metadata: content merged with the learner's stored
    /// progress. Pathways absent from the snapshot show zero progress.
    pub fn meta(&self, snapshot: Option<&ProgressSnapshot>) -> Vec<PathwayMeta> {
        self.pathways
            .iter()
            .map(|p| PathwayMeta {
                id: p.id.clone(),
                slug: p.slug.clone(),
                title: p.title.clone(),
                short_title: p.short_title.clone(),
                instructor: p.instructor.clone(),
                progress: snapshot.map(|s| s.pathway_percent(&p.id)).unwrap_or(0.0),
                is_available: p.is_available,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traverse_core::{ResourceKind, UserId};

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

    fn library() -> ContentLibrary {
        let pathway = Pathway {
            id: PathwayId::from("mlops"),
            slug: "mlops".to_string(),
            title: "MLOps".to_string(),
            short_title: "MLOps".to_string(),
            instructor: "Robin".to_string(),
            description: String::new(),
            level: Default::default(),
            prerequisites: vec![],
            learning_outcomes: vec![],
            tools: vec![],
            tags: vec![],
            modules: vec![Module {
                id: ModuleId::from("module-1"),
                title: "Foundations".to_string(),
                description: String::new(),
                duration: None,
                difficulty: Default::default(),
                topics: vec![],
                resources: vec![resource("intro-video", ResourceKind::Video)],
                is_available: true,
            }],
            is_available: true,
        };
        ContentLibrary::new(vec![pathway]).unwrap()
    }

    #[test]
    fn resolves_resources_to_their_context() {
        let lib = library();
        let ctx = lib.find_resource(&ResourceId::from("intro-video")).unwrap();
        assert_eq!(ctx.pathway.id, PathwayId::from("mlops"));
        assert_eq!(ctx.module.id, ModuleId::from("module-1"));
        assert_eq!(ctx.resource.kind, ResourceKind::Video);
        assert!(lib.find_resource(&ResourceId::from("missing")).is_none());
    }

    #[test]
    fn duplicate_pathway_ids_are_rejected() {
        let lib = library();
        let duplicate = lib.pathways()[0].clone();
        let result = ContentLibrary::new(vec![lib.pathways()[0].clone(), duplicate]);
        assert!(matches!(result, Err(ContentError::Duplicate(_))));
    }

    #[test]
    fn meta_defaults_to_zero_progress_without_snapshot() {
        let lib = library();
        let meta = lib.meta(None);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].progress, 0.0);
    }

    #[tokio::test]
    async fn load_dir_reads_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let pathway_json = serde_json::json!({
            "id": "devops",
            "slug": "devops",
            "title": "DevOps",
            "short_title": "DevOps",
            "instructor": "Kim",
            "modules": [],
        });
        tokio::fs::write(
            dir.path().join("devops.json"),
            serde_json::to_string_pretty(&pathway_json).unwrap(),
        )
        .await
        .unwrap();

        let lib = ContentLibrary::load_dir(dir.path()).await.unwrap();
        assert!(lib.pathway_exists("devops"));
        assert_eq!(lib.slugs(), vec!["devops"]);

        let empty = ProgressSnapshot::empty(UserId::new());
        assert_eq!(lib.meta(Some(&empty))[0].progress, 0.0);
    }
}
