//! Job-description generation. Unlike skill extraction there is no local
//! fallback: provider failures surface to the caller.

use crate::errors::AppError;
use crate::jobs::prompts::{
    JD_GENERATION_MAX_TOKENS, JD_GENERATION_PROMPT_TEMPLATE, JD_GENERATION_SYSTEM,
    JD_GENERATION_TEMPERATURE,
};
use crate::jobs::validation::JdDetails;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{CompletionRequest, LlmError, TextProvider};

pub fn build_jd_prompt(details: &JdDetails) -> String {
    let mut lines = vec![
        format!("Job Title: {}", details.title),
        format!("Company: {}", details.company),
    ];
    if let Some(location) = &details.location {
        lines.push(format!("Location: {location}"));
    }
    if let Some(experience) = &details.experience {
        lines.push(format!("Experience: {experience}"));
    }
    fill_template(JD_GENERATION_PROMPT_TEMPLATE, &[("details", &lines.join("\n"))])
}

pub async fn generate_job_description(
    provider: Option<&dyn TextProvider>,
    details: &JdDetails,
) -> Result<String, AppError> {
    let provider = provider.ok_or_else(|| llm_error(LlmError::NotConfigured))?;
    let prompt = build_jd_prompt(details);

    let text = provider
        .complete(CompletionRequest {
            system: Some(JD_GENERATION_SYSTEM),
            prompt: &prompt,
            temperature: JD_GENERATION_TEMPERATURE,
            max_tokens: JD_GENERATION_MAX_TOKENS,
        })
        .await
        .map_err(llm_error)?;

    Ok(text.trim().to_string())
}

fn llm_error(e: LlmError) -> AppError {
    AppError::Llm(format!("Job description generation failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> JdDetails {
        JdDetails {
            title: "Platform Engineer".to_string(),
            company: "Acme".to_string(),
            location: Some("Remote".to_string()),
            experience: None,
        }
    }

    #[test]
    fn test_prompt_lists_only_provided_fields() {
        let prompt = build_jd_prompt(&details());
        assert!(prompt.contains("Job Title: Platform Engineer\nCompany: Acme\nLocation: Remote"));
        assert!(!prompt.contains("Experience:"));
    }

    #[tokio::test]
    async fn test_missing_provider_is_an_llm_error() {
        let err = generate_job_description(None, &details()).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(msg) if msg.contains("No text provider")));
    }
}
