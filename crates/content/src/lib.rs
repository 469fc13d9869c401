//! Content tables for Traverse.
//!
//! Loads editorially authored pathway definitions and resolves resources,
//! modules and pathways for the progress engine.

#![warn(missing_docs)]

pub mod library;

pub use library::{ContentError, ContentLibrary, ResourceContext, Result};
