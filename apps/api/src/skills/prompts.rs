// Prompt constants for skill extraction.

/// Skill extraction prompt. Replace `{min}`, `{max}` and `{text}` before sending.
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = "Extract {min}-{max} distinct most-relevant \
skills/technologies from the following job text. {list_instruction}\n\n---\n{text}\n\nList:";

/// Extraction output is parsed mechanically, so sampling stays deterministic.
pub const SKILL_EXTRACTION_TEMPERATURE: f32 = 0.0;
pub const SKILL_EXTRACTION_MAX_TOKENS: u32 = 200;
