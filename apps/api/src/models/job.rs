use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::skills::SkillContext;

/// Publication state of a posting. New postings start as drafts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Active,
    Closed,
    #[default]
    Draft,
}

impl PostingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostingStatus::Active => "active",
            PostingStatus::Closed => "closed",
            PostingStatus::Draft => "draft",
        }
    }
}

impl FromStr for PostingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PostingStatus::Active),
            "closed" => Ok(PostingStatus::Closed),
            "draft" => Ok(PostingStatus::Draft),
            other => Err(format!("{other} is not a valid status")),
        }
    }
}

impl fmt::Display for PostingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the background skill generation for one job.
///
/// Moves pending → processing → done | failed. A re-trigger from a terminal
/// state goes back to processing; nothing ever returns to pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillGenerationStatus {
    #[default]
    Pending,
    Processing,
    Done,
    Failed,
}

impl SkillGenerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillGenerationStatus::Pending => "pending",
            SkillGenerationStatus::Processing => "processing",
            SkillGenerationStatus::Done => "done",
            SkillGenerationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SkillGenerationStatus::Done | SkillGenerationStatus::Failed)
    }
}

/// A job posting together with its generated skill metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub status: PostingStatus,
    pub required_skills: Vec<String>,
    pub top_skill: Option<String>,
    pub skills_generated: bool,
    pub skill_generation_status: SkillGenerationStatus,
    pub skill_generation_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// True once the job carries any generated skill data.
    pub fn has_generated_skills(&self) -> bool {
        !self.required_skills.is_empty() || self.top_skill.is_some() || self.skills_generated
    }

    pub fn is_open(&self) -> bool {
        self.status == PostingStatus::Active
    }

    pub fn skill_context(&self) -> SkillContext {
        SkillContext {
            title: self.title.clone(),
            company: self.company.clone(),
            description: self.description.clone(),
        }
    }
}

/// A validated, normalized job ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub status: PostingStatus,
    pub required_skills: Vec<String>,
}

impl NewJob {
    /// Materializes the record the store would create at `now`.
    pub fn into_job(self, id: Uuid, now: DateTime<Utc>) -> Job {
        Job {
            id,
            title: self.title,
            company: self.company,
            description: self.description,
            location: self.location,
            experience: self.experience,
            status: self.status,
            required_skills: self.required_skills,
            top_skill: None,
            skills_generated: false,
            skill_generation_status: SkillGenerationStatus::Pending,
            skill_generation_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filters and pagination for job listings. `page` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<PostingStatus>,
    pub company: Option<String>,
    pub text: Option<String>,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            status: None,
            company: None,
            text: None,
        }
    }
}

impl JobQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// In-process equivalent of the store's SQL filter.
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }
        if let Some(company) = &self.company {
            if !contains_ignore_case(&job.company, company) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let hit = [&job.title, &job.company, &job.description]
                .iter()
                .any(|field| contains_ignore_case(field, text));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// One page of jobs plus the total count matching the filters.
#[derive(Debug, Clone)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: u64,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
