//! Request validation for job creation and job-description generation.
//!
//! Strings are trimmed first and empty values count as missing; length limits
//! are declared with `validator` and reported per field.

use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;
use crate::models::job::{NewJob, PostingStatus};

/// Field order used when reporting length violations.
const FIELD_ORDER: &[&str] = &["title", "company", "description", "location", "experience"];

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(length(max = 200, message = "Job title cannot exceed 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 100, message = "Company name cannot exceed 100 characters"))]
    pub company: Option<String>,
    #[validate(length(max = 5000, message = "Description cannot exceed 5000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 150, message = "Location cannot exceed 150 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 100, message = "Experience field cannot exceed 100 characters"))]
    pub experience: Option<String>,
    /// Kept loose so a non-array value gets a field-level message instead of
    /// a body rejection.
    pub required_skills: Option<Value>,
    pub status: Option<String>,
}

impl CreateJobRequest {
    pub fn into_new_job(self) -> Result<NewJob, AppError> {
        let request = CreateJobRequest {
            title: normalize(self.title),
            company: normalize(self.company),
            description: normalize(self.description),
            location: normalize(self.location),
            experience: normalize(self.experience),
            required_skills: self.required_skills,
            status: normalize(self.status),
        };

        let (Some(title), Some(company), Some(description)) = (
            request.title.clone(),
            request.company.clone(),
            request.description.clone(),
        ) else {
            return Err(AppError::Validation(
                "title, company and description are required".to_string(),
            ));
        };

        let mut errors = match request.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_messages(&e),
        };

        let required_skills = match parse_required_skills(request.required_skills) {
            Ok(skills) => skills,
            Err(message) => {
                errors.push(message);
                Vec::new()
            }
        };

        let status = match request.status.as_deref().map(str::parse::<PostingStatus>) {
            None => PostingStatus::default(),
            Some(Ok(status)) => status,
            Some(Err(message)) => {
                errors.push(message);
                PostingStatus::default()
            }
        };

        if !errors.is_empty() {
            return Err(AppError::InvalidFields(errors));
        }

        Ok(NewJob {
            title,
            company,
            description,
            location: request.location,
            experience: request.experience,
            status,
            required_skills,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateJdRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
}

/// A job-description request with its required fields present.
#[derive(Debug, Clone, PartialEq)]
pub struct JdDetails {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub experience: Option<String>,
}

impl GenerateJdRequest {
    pub fn into_details(self) -> Result<JdDetails, AppError> {
        match (normalize(self.title), normalize(self.company)) {
            (Some(title), Some(company)) => Ok(JdDetails {
                title,
                company,
                location: normalize(self.location),
                experience: normalize(self.experience),
            }),
            _ => Err(AppError::Validation("title and company are required".to_string())),
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts a missing/null value or an array of strings; trims entries and
/// drops empty ones.
fn parse_required_skills(value: Option<Value>) -> Result<Vec<String>, String> {
    const MESSAGE: &str = "requiredSkills must be an array of strings";
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                _ => Err(MESSAGE.to_string()),
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect(),
        Some(_) => Err(MESSAGE.to_string()),
    }
}

fn field_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| {
        FIELD_ORDER
            .iter()
            .position(|known| *known == *field)
            .unwrap_or(FIELD_ORDER.len())
    });

    fields
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect()
}
