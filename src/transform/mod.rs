//! Text Transformation Engine
//!
//! Fits arbitrary text into a model round by recursively chunking and
//! shortening it, with a network-free dry run for cost previews.
//!
//! ## Modules
//!
//! - `chunking`: coarse-to-fine chunk size search and overlapping split
//! - `orchestrator`: estimate and execution passes over model rounds
//! - `supersede`: latest-request-wins cancellation for interactive callers
//! - `types`: request and result types

pub mod chunking;
pub mod orchestrator;
pub mod supersede;
pub mod types;

pub use chunking::TextChunker;
pub use orchestrator::TextTransformer;
pub use supersede::LatestOnly;
pub use types::{Status, TextTransformationResult, TransformRequest};
