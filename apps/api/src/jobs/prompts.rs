// Prompt constants for job-description generation.

pub const JD_GENERATION_SYSTEM: &str = "You are an expert HR copywriter. \
    Produce a clear, professional job description targeted to HR and hiring teams. \
    Include a short summary, responsibilities (bullet list), required qualifications (bullet list), \
    preferred qualifications (if any), and a short section on benefits and how to apply. \
    Keep it concise and suitable for posting or internal use.";

/// Replace `{details}` with one "Label: value" line per provided field.
pub const JD_GENERATION_PROMPT_TEMPLATE: &str =
    "Create a job description using the following details:\n\n{details}";

pub const JD_GENERATION_TEMPERATURE: f32 = 0.2;
pub const JD_GENERATION_MAX_TOKENS: u32 = 800;
