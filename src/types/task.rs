//! Task definition: what to extract and the shape of the answer.

use serde::{Deserialize, Serialize};

use crate::types::schema::Schema;

/// One extraction task, immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Natural-language instruction describing what to extract
    pub prompt: String,

    /// Structural contract for the merged answer, if any
    pub schema: Option<Schema>,
}

impl Task {
    /// Create a task with no output schema.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            schema: None,
        }
    }

    /// Attach an output schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}
