// Resume evaluation: prompt rendering, score-line normalization, and the
// analyze endpoint. Backend calls go through llm_client.

pub mod handlers;
pub mod prompt_builder;
pub mod prompts;
pub mod score;

/// The resume and the role it is evaluated against.
#[derive(Debug, Clone)]
pub struct ResumeInput {
    pub resume_text: String,
    pub job_title: String,
    pub sector: String,
    pub experience_level: String,
}
