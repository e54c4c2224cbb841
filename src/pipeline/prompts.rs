//! Synthesis prompt for the merge step.

use crate::pipeline::merge::SynthesisContext;
use crate::types::task::Task;

/// Prompt for merging per-source payloads into a single answer.
pub const MERGE_PROMPT: &str = r#"You have extracted structured content from multiple independent sources.
You are now asked to provide a single answer to a USER PROMPT based on all of it.

Merge the content from the different sources into one answer without repetitions.
The extracted contents are in JSON format; merge them based on context and produce
a single correct JSON structure. Where sources conflict, use your judgement and
prefer the better-supported value.

Some sources may have failed; the failure summary tells you which. Do not present
partial coverage as complete.

Make sure the output is valid JSON without any errors. Do not wrap the response
in backticks or start it with ```json.

OUTPUT INSTRUCTIONS: {format_instructions}

FAILURE SUMMARY: {failure_summary}

USER PROMPT: {user_prompt}

SOURCE CONTENT:
{source_content}"#;

/// Format the merge prompt for a task and synthesis context.
pub fn format_merge_prompt(task: &Task, context: &SynthesisContext) -> String {
    let format_instructions = match &task.schema {
        Some(schema) => schema.format_instructions(),
        None => "Return a valid JSON object.".to_string(),
    };

    MERGE_PROMPT
        .replace("{format_instructions}", &format_instructions)
        .replace("{failure_summary}", &context.failure_summary())
        .replace("{user_prompt}", &task.prompt)
        .replace("{source_content}", &context.render_content())
}
