//! Skill ranking: picks the single most contextually relevant skill.
//!
//! score = 10 if the skill occurs anywhere in "title company description"
//!       + 5  if it also occurs in the title
//!       + max(0, 5 - len / 10)   (brevity bonus)
//!
//! The brevity bonus is a tunable tie-breaker kept for compatibility with
//! previously generated data, not a load-bearing signal.

use serde::Serialize;

use crate::skills::SkillContext;

pub const CONTEXT_MATCH_WEIGHT: f64 = 10.0;
pub const TITLE_MATCH_WEIGHT: f64 = 5.0;
pub const MAX_BREVITY_BONUS: f64 = 5.0;
/// Characters of skill length that cost one point of brevity bonus.
pub const BREVITY_DECAY_CHARS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSkill {
    pub skill: String,
    pub score: f64,
}

pub fn score_skill(skill: &str, context_text: &str, title: &str) -> f64 {
    let lower = skill.to_lowercase();
    let mut score = 0.0;
    if context_text.contains(&lower) {
        score += CONTEXT_MATCH_WEIGHT;
    }
    if title.contains(&lower) {
        score += TITLE_MATCH_WEIGHT;
    }
    let length = lower.chars().count() as f64;
    score + (MAX_BREVITY_BONUS - length / BREVITY_DECAY_CHARS).max(0.0)
}

/// Highest-scoring skill; the earliest one wins ties. `None` for an empty list.
pub fn rank_skills(skills: &[String], context: &SkillContext) -> Option<RankedSkill> {
    let context_text = context.ranking_text();
    let title = context.title.to_lowercase();

    let mut best: Option<RankedSkill> = None;
    for skill in skills {
        let score = score_skill(skill, &context_text, &title);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(RankedSkill {
                skill: skill.clone(),
                score,
            });
        }
    }

    match &best {
        Some(ranked) => tracing::debug!("Top skill selected: {} (score {:.2})", ranked.skill, ranked.score),
        None => tracing::debug!("No skills to rank"),
    }
    best
}

pub fn top_skill(skills: &[String], context: &SkillContext) -> Option<String> {
    rank_skills(skills, context).map(|ranked| ranked.skill)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SkillContext {
        SkillContext {
            title: "Senior React Developer".to_string(),
            company: "Acme".to_string(),
            description: "Build UIs with React and TypeScript. Docker is a plus.".to_string(),
        }
    }

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_list_ranks_none() {
        assert!(rank_skills(&[], &context()).is_none());
        assert!(top_skill(&[], &context()).is_none());
    }

    #[test]
    fn test_title_match_beats_description_match() {
        let top = top_skill(&skills(&["TypeScript", "Docker", "React"]), &context());
        assert_eq!(top.as_deref(), Some("React"));
    }

    #[test]
    fn test_score_formula() {
        let ctx = context();
        let text = ctx.ranking_text();
        let title = ctx.title.to_lowercase();
        // in text + in title + (5 - 5/10)
        assert!((score_skill("React", &text, &title) - 19.5).abs() < 1e-9);
        // in text only + (5 - 10/10)
        assert!((score_skill("TypeScript", &text, &title) - 14.0).abs() < 1e-9);
        // absent: brevity bonus only
        assert!((score_skill("Kotlin", &text, &title) - 4.4).abs() < 1e-9);
    }

    #[test]
    fn test_brevity_bonus_never_negative() {
        let long = "x".repeat(120);
        assert_eq!(score_skill(&long, "", ""), 0.0);
    }

    #[test]
    fn test_ties_resolve_to_first_occurrence() {
        let top = top_skill(&skills(&["Kafka", "Scala"]), &context());
        assert_eq!(top.as_deref(), Some("Kafka"));
        let top = top_skill(&skills(&["Scala", "Kafka"]), &context());
        assert_eq!(top.as_deref(), Some("Scala"));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let list = skills(&["Docker", "TypeScript", "React", "Acme", "UIs"]);
        let first = rank_skills(&list, &context());
        for _ in 0..10 {
            assert_eq!(rank_skills(&list, &context()), first);
        }
    }

    #[test]
    fn test_case_insensitive_match() {
        let ranked = rank_skills(&skills(&["docker", "REACT"]), &context()).unwrap();
        assert_eq!(ranked.skill, "REACT");
    }
}
