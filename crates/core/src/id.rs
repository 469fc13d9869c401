//! Unique identifiers for Traverse entities.
//!
//! Learner-generated records (completions, submissions, attempts, reviews)
//! carry ULID identifiers. Content entities (pathways, modules, resources)
//! are identified by editorially authored slugs, so those ids wrap strings.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new identifier
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id! {
    /// Unique identifier for a learner account
    UserId
}

ulid_id! {
    /// Unique identifier for a ResourceCompletion record
    CompletionId
}

ulid_id! {
    /// Unique identifier for a ResourceSubmission record
    SubmissionId
}

ulid_id! {
    /// Unique identifier for a ModuleReview record
    ReviewId
}

ulid_id! {
    /// Unique identifier for a QuizAttempt record
    AttemptId
}

macro_rules! slug_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from a slug
            pub fn new(slug: impl Into<String>) -> Self {
                Self(slug.into())
            }

            /// The underlying slug
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

slug_id! {
    /// Identifier of a Pathway (content slug, e.g. `computer-vision`)
    PathwayId
}

slug_id! {
    /// Identifier of a Module within a pathway
    ModuleId
}

slug_id! {
    /// Identifier of a Resource within a module
    ResourceId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulid_ids_are_unique() {
        assert_ne!(CompletionId::new(), CompletionId::new());
    }

    #[test]
    fn ulid_id_round_trips_through_display() {
        let id = SubmissionId::new();
        let parsed: SubmissionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn slug_ids_compare_by_content() {
        assert_eq!(PathwayId::from("mlops"), PathwayId::new("mlops"));
        assert_ne!(PathwayId::from("mlops"), PathwayId::from("devops"));
    }
}
