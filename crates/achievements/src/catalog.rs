//! Built-in achievement catalog.
//!
//! A static rule table: nothing here is created or destroyed at runtime.
//! Deployments with pathway-specific achievements extend this table from
//! their own content.

use traverse_core::{
    AchievementCategory, AchievementDef, Rarity, Requirement, RequirementKind,
};

fn achievement(
    id: &str,
    title: &str,
    description: &str,
    rarity: Rarity,
    category: AchievementCategory,
    kind: RequirementKind,
    value: u32,
    points: u32,
) -> AchievementDef {
    AchievementDef {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        rarity,
        category,
        requirement: Requirement {
            kind,
            value,
            pathway: None,
        },
        points,
    }
}

/// The standard achievement table.
pub fn builtin_catalog() -> Vec<AchievementDef> {
    use AchievementCategory::*;
    use Rarity::*;
    use RequirementKind::*;

    vec![
        // Progress milestones
        achievement(
            "first-steps",
            "First Steps",
            "Complete your first module in any pathway",
            Common,
            Progress,
            ModulesComplete,
            1,
            10,
        ),
        achievement(
            "getting-started",
            "Getting Started",
            "Reach 10% total progress across all pathways",
            Common,
            Progress,
            TotalProgress,
            10,
            25,
        ),
        achievement(
            "making-progress",
            "Making Progress",
            "Reach 25% total progress across all pathways",
            Common,
            Progress,
            TotalProgress,
            25,
            50,
        ),
        achievement(
            "halfway-hero",
            "Halfway Hero",
            "Reach 50% total progress across all pathways",
            Rare,
            Progress,
            TotalProgress,
            50,
            100,
        ),
        achievement(
            "almost-there",
            "Almost There",
            "Reach 75% total progress across all pathways",
            Rare,
            Progress,
            TotalProgress,
            75,
            150,
        ),
        achievement(
            "overachiever",
            "Overachiever",
            "Reach 100% progress across all pathways",
            Legendary,
            Progress,
            TotalProgress,
            100,
            5000,
        ),
        // Completion
        achievement(
            "first-pathway",
            "First Pathway Complete",
            "Complete your very first pathway",
            Rare,
            Completion,
            PathwayComplete,
            1,
            200,
        ),
        achievement(
            "pathway-trio",
            "Pathway Trio",
            "Complete 3 different pathways",
            Epic,
            Completion,
            PathwayComplete,
            3,
            500,
        ),
        achievement(
            "pathway-master",
            "Pathway Master",
            "Complete 5 different pathways",
            Epic,
            Completion,
            PathwayComplete,
            5,
            1000,
        ),
        // Exploration
        achievement(
            "curious-learner",
            "Curious Learner",
            "Start learning in 3 different pathways",
            Common,
            Exploration,
            PathwaysStarted,
            3,
            30,
        ),
        achievement(
            "pathway-explorer",
            "Pathway Explorer",
            "Start learning in 5 different pathways",
            Rare,
            Exploration,
            PathwaysStarted,
            5,
            75,
        ),
        achievement(
            "knowledge-seeker",
            "Knowledge Seeker",
            "Start learning in 8 different pathways",
            Epic,
            Exploration,
            PathwaysStarted,
            8,
            150,
        ),
        // Mastery
        achievement(
            "module-marathon",
            "Module Marathon",
            "Complete 25 modules across all pathways",
            Epic,
            Mastery,
            ModulesComplete,
            25,
            400,
        ),
        achievement(
            "sharp-shooter",
            "Sharp Shooter",
            "Score 100% on 5 different quizzes",
            Rare,
            Mastery,
            PerfectScore,
            5,
            100,
        ),
        achievement(
            "perfectionist",
            "The Perfectionist",
            "Score 100% on 50 different quizzes",
            Legendary,
            Mastery,
            PerfectScore,
            50,
            1000,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = builtin_catalog();
        let mut seen = std::collections::HashSet::new();
        for def in &catalog {
            assert!(seen.insert(def.id.clone()), "duplicate id: {}", def.id);
        }
    }

    #[test]
    fn catalog_has_every_requirement_kind() {
        let catalog = builtin_catalog();
        for kind in [
            RequirementKind::TotalProgress,
            RequirementKind::PathwayComplete,
            RequirementKind::PathwaysStarted,
            RequirementKind::ModulesComplete,
            RequirementKind::PerfectScore,
        ] {
            assert!(
                catalog.iter().any(|a| a.requirement.kind == kind),
                "no achievement uses {:?}",
                kind
            );
        }
    }
}
