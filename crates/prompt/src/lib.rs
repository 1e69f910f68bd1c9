//! Prompt composition for PipeWrench.
//!
//! This crate provides:
//! - Department and role profiles (built-in YAML plus workspace overrides)
//! - The fixed-order compliance prompt, rendered with Handlebars
//! - Character-safe document context truncation

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{truncate_chars, PromptComposer};
pub use loader::{ProfileCatalog, DEFAULT_DEPARTMENT_ID};
pub use types::{
    ComposedPrompt, ComposedPromptMetadata, DepartmentProfile, ProfileSet, PromptSections,
    RoleProfile,
};
