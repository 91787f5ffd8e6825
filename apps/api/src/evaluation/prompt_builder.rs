//! Renders the evaluation template for one request.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::evaluation::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_PROMPT_VERSION};
use crate::evaluation::ResumeInput;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(job_title|sector|experience_level|resume_text)\}")
        .expect("placeholder pattern is valid")
});

/// Renders the evaluation prompt.
///
/// The resume is cut to `max_resume_chars` characters before it is embedded.
/// `extra_instructions`, when present, follows the rendered template after a
/// blank line. Placeholders are substituted in a single pass, so braces inside
/// user-supplied values are never expanded.
pub fn build_evaluation_prompt(
    input: &ResumeInput,
    max_resume_chars: usize,
    extra_instructions: Option<&str>,
) -> String {
    let resume_text = truncate_chars(&input.resume_text, max_resume_chars);

    let mut prompt = render(EVALUATION_PROMPT_TEMPLATE, |name| match name {
        "job_title" => input.job_title.as_str(),
        "sector" => input.sector.as_str(),
        "experience_level" => input.experience_level.as_str(),
        _ => resume_text,
    });

    if let Some(extra) = extra_instructions {
        prompt.push_str("\n\n");
        prompt.push_str(extra);
    }

    debug!(
        template_version = EVALUATION_PROMPT_VERSION,
        resume_chars = resume_text.chars().count(),
        prompt_len = prompt.len(),
        "Rendered evaluation prompt"
    );

    prompt
}

fn render<'a>(template: &str, value_for: impl Fn(&str) -> &'a str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| value_for(&caps[1]).to_string())
        .into_owned()
}

/// Returns at most `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
