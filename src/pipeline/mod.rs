//! Orchestration pipeline: fan-out, collection, and merge.

pub mod collect;
pub mod fanout;
pub mod merge;
pub mod prompts;

pub use collect::collect;
pub use fanout::{fan_out, Settlement};
pub use merge::{merge, FailureNote, SynthesisContext, TaggedPayload};
pub use prompts::{format_merge_prompt, MERGE_PROMPT};
