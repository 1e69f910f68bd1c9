//! Answer pipeline for PipeWrench.
//!
//! Sequences prompt composition, a single model call, citation extraction
//! and whitelist checking into one [`ComplianceResult`].
//!
//! # Example
//! ```no_run
//! use pipewrench_answer::{AnswerPipeline, QueryRequest};
//! use pipewrench_compliance::WhitelistRegistry;
//! use pipewrench_prompt::ProfileCatalog;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = AnswerPipeline::builder()
//!     .registry(Arc::new(WhitelistRegistry::builtin()?))
//!     .profiles(Arc::new(ProfileCatalog::builtin()?))
//!     .build()?;
//!
//! let request = QueryRequest::new("What PPE is required for confined space entry?")
//!     .with_department("water_wastewater");
//! let result = pipeline.answer(&request).await?;
//! println!("{}", result.render());
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod types;

#[cfg(test)]
mod tests;

pub use pipeline::{AnswerPipeline, AnswerPipelineBuilder, PipelineOptions};
pub use types::{AnswerMode, ComplianceResult, QueryRequest};
