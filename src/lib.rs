//! Multi-Source Extraction Orchestration Library
//!
//! Fans one extraction task out across N independent sources, runs each
//! source's pipeline to completion under bounded concurrency, collects
//! partial results and partial failures without losing successful work,
//! and merges the surviving payloads into one consolidated structured
//! answer via a single synthesis call.
//!
//! # Design Philosophy
//!
//! - Per-source failures are data, not errors: they degrade coverage,
//!   never abort the run
//! - The per-source pipeline and the synthesizer are opaque
//!   collaborators behind traits; this crate owns only the
//!   orchestration between them
//! - Stable ordering: outcomes are indexed by original source position,
//!   independent of completion timing
//! - Conflict resolution between sources belongs to the synthesizer, not
//!   to a precedence rule in this layer
//!
//! # Usage
//!
//! ```rust,ignore
//! use multisource::{Orchestrator, RunOptions, Source, Task, Schema, FieldKind};
//!
//! let task = Task::new("What is this product's price?")
//!     .with_schema(Schema::new().required("price", FieldKind::Number));
//!
//! let sources = vec![
//!     Source::url("https://shop-a.example/widget"),
//!     Source::url("https://shop-b.example/widget"),
//!     Source::file("/data/widget-datasheet.txt"),
//! ];
//!
//! let orchestrator = Orchestrator::new(pipeline, synthesizer)
//!     .with_options(RunOptions::new().with_concurrency_limit(4));
//!
//! let result = orchestrator.run(&task, &sources).await?;
//! println!("answer: {}", result.answer);
//! println!("{} succeeded, {} failed", result.succeeded(), result.failed());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (SourcePipeline, Synthesizer)
//! - [`types`] - Sources, tasks, schemas, outcomes, reports, options
//! - [`pipeline`] - Fan-out, collection, and merge
//! - [`orchestrator`] - The entry point wiring it all together
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    InvalidInput, MergeError, OrchestratorError, PipelineError, SynthesisError, ValidationError,
};
pub use traits::{SourcePipeline, Synthesizer};
pub use types::{
    options::{MergeConfig, RunOptions},
    outcome::{FailureKind, OutcomeSet, SettledSource, SourceFailure, SourceOutcome},
    report::{MergedResult, RunReport, SourceReport, SourceStatus},
    schema::{FieldKind, FieldSpec, Schema},
    source::{Source, SourceKind},
    task::Task,
};

// Re-export the orchestrator entry points
pub use orchestrator::{run_multi_source_extraction, Orchestrator};

// Re-export pipeline components
pub use pipeline::{
    collect, fan_out, format_merge_prompt, merge, FailureNote, Settlement, SynthesisContext,
    TaggedPayload,
};

// Re-export testing utilities
pub use testing::{MockPipeline, MockSynthesizer, TestScenario};
