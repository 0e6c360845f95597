// Skill generation pipeline: extraction (provider or heuristic), ranking,
// the per-job generation task, and the queue/worker that runs it off the
// request path.

pub mod extraction;
pub mod prompts;
pub mod ranking;
pub mod task;
pub mod worker;

use serde::{Deserialize, Serialize};

/// The job fields skill generation reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillContext {
    pub title: String,
    pub company: String,
    pub description: String,
}

impl SkillContext {
    /// Input for extraction: one field per line.
    pub fn extraction_text(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.company, self.description)
    }

    /// Lowercased haystack used by ranking.
    pub fn ranking_text(&self) -> String {
        format!("{} {} {}", self.title, self.company, self.description).to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_texts() {
        let context = SkillContext {
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Tokio and Axum".to_string(),
        };
        assert_eq!(context.extraction_text(), "Rust Engineer\nAcme\nTokio and Axum");
        assert_eq!(context.ranking_text(), "rust engineer acme tokio and axum");
    }
}
