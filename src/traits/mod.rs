//! Core trait abstractions.
//!
//! These traits are the seams of the library: the orchestrator only
//! talks to the per-source pipeline and the synthesizer through them.

pub mod pipeline;
pub mod synthesizer;

pub use pipeline::SourcePipeline;
pub use synthesizer::Synthesizer;
