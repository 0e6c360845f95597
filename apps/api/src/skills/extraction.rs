//! Skill extraction: derives a bounded, deduplicated skill list from job text.
//!
//! `HybridSkillExtractor` asks the text provider first and falls back to a local
//! heuristic (technology whitelist, then notable tokens, then frequent tokens)
//! whenever the provider is absent, fails, or returns too few items.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SkillBounds;
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, PLAIN_LIST_INSTRUCTION};
use crate::llm_client::{CompletionRequest, LlmError, TextProvider};
use crate::skills::prompts::{
    SKILL_EXTRACTION_MAX_TOKENS, SKILL_EXTRACTION_PROMPT_TEMPLATE, SKILL_EXTRACTION_TEMPERATURE,
};

/// Technology names recognized by the heuristic, matched in this order.
pub const KNOWN_SKILLS: &[&str] = &[
    "JavaScript",
    "TypeScript",
    "React",
    "Vue",
    "Angular",
    "Node.js",
    "Express.js",
    "MongoDB",
    "PostgreSQL",
    "MySQL",
    "HTML",
    "CSS",
    "Sass",
    "Tailwind",
    "Redux",
    "Next.js",
    "Gatsby",
    "GraphQL",
    "REST",
    "Docker",
    "Kubernetes",
    "AWS",
    "Azure",
    "Python",
    "Django",
    "Flask",
    "Java",
    "Spring",
    "C#",
    ".NET",
    "Go",
    "PHP",
    "Laravel",
];

/// Provider lists shorter than this (capped by the configured minimum) are discarded.
const ACCEPTABLE_PROVIDER_MIN: usize = 3;

/// Tokens must be longer than this to count as skills on their own.
const MIN_TOKEN_LEN: usize = 2;

/// Seam used by the generation task; swapped for scripted extractors in tests.
#[async_trait]
pub trait SkillExtractor: Send + Sync {
    async fn extract(&self, text: &str, bounds: SkillBounds) -> Result<Vec<String>, AppError>;
}

/// Provider-first extractor with a heuristic fallback. Never fails.
pub struct HybridSkillExtractor {
    provider: Option<Arc<dyn TextProvider>>,
}

impl HybridSkillExtractor {
    pub fn new(provider: Option<Arc<dyn TextProvider>>) -> Self {
        Self { provider }
    }

    pub async fn extract_skills(&self, text: &str, bounds: SkillBounds) -> Vec<String> {
        let input = text.trim();
        if input.is_empty() {
            return Vec::new();
        }

        if let Some(provider) = &self.provider {
            match extract_with_provider(provider.as_ref(), input, bounds).await {
                Ok(list) if list.len() >= acceptable_min(bounds) => {
                    info!("Skill extraction (provider) success: {}", list.join(", "));
                    return list;
                }
                Ok(list) => warn!(
                    "Skill extraction (provider) returned too few items ({}), falling back to heuristic",
                    list.len()
                ),
                Err(e) => warn!("Provider skill extraction failed, falling back to heuristic: {e}"),
            }
        }

        let skills = heuristic_skills(input, bounds);
        info!(
            "Skill extraction fallback (heuristic) produced {} items: {}",
            skills.len(),
            skills.join(", ")
        );
        skills
    }
}

#[async_trait]
impl SkillExtractor for HybridSkillExtractor {
    async fn extract(&self, text: &str, bounds: SkillBounds) -> Result<Vec<String>, AppError> {
        Ok(self.extract_skills(text, bounds).await)
    }
}

fn acceptable_min(bounds: SkillBounds) -> usize {
    bounds.min.min(ACCEPTABLE_PROVIDER_MIN)
}

async fn extract_with_provider(
    provider: &dyn TextProvider,
    input: &str,
    bounds: SkillBounds,
) -> Result<Vec<String>, LlmError> {
    let min = bounds.min.to_string();
    let max = bounds.max.to_string();
    let prompt = fill_template(
        SKILL_EXTRACTION_PROMPT_TEMPLATE,
        &[
            ("min", &min),
            ("max", &max),
            ("list_instruction", PLAIN_LIST_INSTRUCTION),
            ("text", input),
        ],
    );

    let output = provider
        .complete(CompletionRequest {
            system: None,
            prompt: &prompt,
            temperature: SKILL_EXTRACTION_TEMPERATURE,
            max_tokens: SKILL_EXTRACTION_MAX_TOKENS,
        })
        .await?;

    Ok(parse_skill_list(&output, bounds.max))
}

/// Splits provider output on commas, newlines and semicolons.
pub fn parse_skill_list(raw: &str, max: usize) -> Vec<String> {
    let mut skills = SkillSet::with_limit(max);
    for item in raw.split([',', '\n', ';']) {
        skills.insert(item.trim());
    }
    skills.into_vec()
}

/// Local fallback used when no provider result is usable.
pub fn heuristic_skills(input: &str, bounds: SkillBounds) -> Vec<String> {
    let tokens = tokenize(input);
    let mut found = SkillSet::with_limit(bounds.max);

    // 1) known technologies, anywhere in the text
    let lower_input = input.to_lowercase();
    for skill in KNOWN_SKILLS {
        if found.is_full() {
            break;
        }
        if lower_input.contains(&skill.to_lowercase()) {
            found.insert(skill);
        }
    }

    // 2) capitalized tokens and tokens shaped like tech names (node.js, c#, react-native)
    for token in &tokens {
        if found.is_full() {
            break;
        }
        if is_notable_token(token) {
            found.insert(token);
        }
    }

    // 3) most frequent remaining tokens
    if found.len() < bounds.min {
        for token in tokens_by_frequency(&tokens) {
            if found.len() >= bounds.min || found.is_full() {
                break;
            }
            if token.chars().count() > MIN_TOKEN_LEN {
                found.insert(token);
            }
        }
    }

    found.into_vec()
}

/// Splits on every character that is not a word character or one of `+ . # -`.
fn tokenize(input: &str) -> Vec<String> {
    input
        .split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '.' | '#' | '-')))
        .map(|token| {
            let token = token.strip_prefix('.').unwrap_or(token);
            token.strip_suffix(',').unwrap_or(token)
        })
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

fn is_notable_token(token: &str) -> bool {
    if token.chars().count() <= MIN_TOKEN_LEN {
        return false;
    }
    let capitalized = token.chars().next().is_some_and(|c| c.is_ascii_uppercase());
    capitalized || token.contains(['.', '#', '-'])
}

/// Distinct tokens ordered by descending frequency; ties keep first appearance.
fn tokens_by_frequency(tokens: &[String]) -> Vec<&str> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        let count = counts.entry(token.as_str()).or_insert(0);
        if *count == 0 {
            order.push(token.as_str());
        }
        *count += 1;
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
}

/// Insertion-ordered, case-insensitively distinct list with an upper bound.
struct SkillSet {
    items: Vec<String>,
    seen: HashSet<String>,
    limit: usize,
}

impl SkillSet {
    fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            limit,
        }
    }

    fn insert(&mut self, skill: &str) -> bool {
        if skill.is_empty() || self.is_full() {
            return false;
        }
        if !self.seen.insert(skill.to_lowercase()) {
            return false;
        }
        self.items.push(skill.to_string());
        true
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BOUNDS: SkillBounds = SkillBounds { min: 6, max: 10 };

    struct ScriptedProvider {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextProvider for ScriptedProvider {
        async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| LlmError::Api {
                status: 503,
                message: "provider outage".to_string(),
            })
        }
    }

    fn assert_case_insensitive_distinct(skills: &[String]) {
        let lowered: HashSet<String> = skills.iter().map(|s| s.to_lowercase()).collect();
        assert_eq!(lowered.len(), skills.len(), "duplicates in {skills:?}");
    }

    #[test]
    fn test_heuristic_finds_known_technologies() {
        let text = "Full Stack Developer\nKPMG\nLooking for React, Node.js and MongoDB experience";
        let skills = heuristic_skills(text, BOUNDS);
        for expected in ["React", "Node.js", "MongoDB"] {
            assert!(skills.contains(&expected.to_string()), "{expected} missing from {skills:?}");
        }
        assert!(skills.len() >= 3 && skills.len() <= 10);
        assert_case_insensitive_distinct(&skills);
    }

    #[test]
    fn test_heuristic_whitelist_order_first() {
        let skills = heuristic_skills("We use Python, Docker and AWS daily", BOUNDS);
        assert_eq!(&skills[..3], &["Docker", "AWS", "Python"]);
    }

    #[test]
    fn test_heuristic_caps_at_max() {
        let text = "JavaScript TypeScript React Vue Angular Node.js MongoDB MySQL HTML CSS Sass Redux";
        let skills = heuristic_skills(text, SkillBounds { min: 2, max: 4 });
        assert_eq!(skills, vec!["JavaScript", "TypeScript", "React", "Vue"]);
    }

    #[test]
    fn test_heuristic_frequency_fill_when_short() {
        let text = "kafka kafka kafka streaming streaming etl";
        let skills = heuristic_skills(text, BOUNDS);
        assert_eq!(skills, vec!["kafka", "streaming", "etl"]);
    }

    #[test]
    fn test_heuristic_dedups_case_insensitively() {
        let skills = heuristic_skills("REACT react React-Native", BOUNDS);
        assert_eq!(skills.iter().filter(|s| s.eq_ignore_ascii_case("react")).count(), 1);
        assert!(skills.contains(&"React-Native".to_string()));
        assert_case_insensitive_distinct(&skills);
    }

    #[test]
    fn test_tokenize_keeps_tech_punctuation() {
        let tokens = tokenize("C#, .NET and Node.js (c++)!");
        assert_eq!(tokens, vec!["C#", "NET", "and", "Node.js", "c++"]);
    }

    #[test]
    fn test_tokens_by_frequency_is_stable() {
        let tokens: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens_by_frequency(&tokens), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_parse_skill_list_splits_and_dedups() {
        let parsed = parse_skill_list("React, node.js;\nNode.js\n, ,TypeScript", 10);
        assert_eq!(parsed, vec!["React", "node.js", "TypeScript"]);
    }

    #[test]
    fn test_parse_skill_list_truncates() {
        let parsed = parse_skill_list("a1, b2, c3, d4", 2);
        assert_eq!(parsed, vec!["a1", "b2"]);
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_without_provider_call() {
        let provider = Arc::new(ScriptedProvider::replying("React, Vue, Go"));
        let extractor = HybridSkillExtractor::new(Some(provider.clone()));
        assert!(extractor.extract_skills("   \n ", BOUNDS).await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_list_is_used_when_long_enough() {
        let provider = Arc::new(ScriptedProvider::replying(
            "Rust, Tokio, Axum, PostgreSQL, Docker, Kubernetes",
        ));
        let extractor = HybridSkillExtractor::new(Some(provider.clone()));
        let skills = extractor.extract_skills("Rust backend role", BOUNDS).await;
        assert_eq!(
            skills,
            vec!["Rust", "Tokio", "Axum", "PostgreSQL", "Docker", "Kubernetes"]
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_provider_list_falls_back_to_heuristic() {
        let provider = Arc::new(ScriptedProvider::replying("Leadership"));
        let extractor = HybridSkillExtractor::new(Some(provider));
        let skills = extractor
            .extract_skills("Looking for React and Docker", BOUNDS)
            .await;
        assert!(skills.contains(&"React".to_string()));
        assert!(skills.contains(&"Docker".to_string()));
        assert!(!skills.contains(&"Leadership".to_string()));
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_heuristic() {
        let provider = Arc::new(ScriptedProvider::failing());
        let extractor = HybridSkillExtractor::new(Some(provider.clone()));
        let skills = extractor
            .extract("Full Stack Developer\nKPMG\nReact, Node.js and MongoDB", BOUNDS)
            .await
            .unwrap();
        assert!(skills.contains(&"MongoDB".to_string()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
