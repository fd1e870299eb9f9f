//! Interview inputs: the job + candidate bundle and the two transcript wire shapes.
//!
//! Every field defaults when absent so a partially filled client payload still
//! produces a usable prompt.

use serde::{Deserialize, Serialize};

use crate::catalog::JobPosting;
use crate::llm_client::{ChatMessage, ChatRole};

/// Candidate profile captured at onboarding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    pub skills: String,
    /// Years of experience, as entered.
    pub experience: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
}

/// Job facts plus candidate profile, injected into the interviewer's system prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterviewContext {
    pub job_title: String,
    pub company: String,
    pub job_description: String,
    pub responsibilities: Vec<String>,
    pub required_qualifications: Vec<String>,
    pub preferred_qualifications: Vec<String>,
    pub skills: Vec<String>,
    pub user_profile: UserProfile,
}

impl InterviewContext {
    pub fn from_job(job: &JobPosting, profile: UserProfile) -> Self {
        Self {
            job_title: job.title.clone(),
            company: job.company.clone(),
            job_description: job.description.clone(),
            responsibilities: job.responsibilities.clone(),
            required_qualifications: job.required.clone(),
            preferred_qualifications: job.preferred.clone(),
            skills: job.skills.clone(),
            user_profile: profile,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(default)]
    pub text: String,
}

/// Gemini-style transcript turn: `{role: "user" | "model", parts: [{text}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

impl From<&HistoryTurn> for ChatMessage {
    fn from(turn: &HistoryTurn) -> Self {
        let content = turn
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        ChatMessage {
            role: role_from_wire(&turn.role),
            content,
        }
    }
}

/// OpenAI-style transcript turn: `{role: "user" | "assistant", content}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        ChatMessage {
            role: role_from_wire(&turn.role),
            content: turn.content.clone(),
        }
    }
}

/// Anything that is not the candidate speaking is the interviewer.
fn role_from_wire(role: &str) -> ChatRole {
    match role {
        "user" => ChatRole::User,
        _ => ChatRole::Assistant,
    }
}

/// Which question catalogue the streamed interviewer draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Personality,
    Technical,
    #[default]
    #[serde(other)]
    Standard,
}

/// Job subset sent by the streaming client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobData {
    pub title: String,
    pub company: String,
    pub description: String,
    pub skills: Vec<String>,
    pub responsibilities: Vec<String>,
}

impl From<&InterviewContext> for JobData {
    fn from(context: &InterviewContext) -> Self {
        Self {
            title: context.job_title.clone(),
            company: context.company.clone(),
            description: context.job_description.clone(),
            skills: context.skills.clone(),
            responsibilities: context.responsibilities.clone(),
        }
    }
}

/// Candidate subset sent by the streaming client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    pub full_name: String,
    pub experience: String,
    pub skills: String,
    pub target_role: String,
    pub resume_text: Option<String>,
}

impl From<&UserProfile> for CandidateProfile {
    fn from(profile: &UserProfile) -> Self {
        Self {
            full_name: profile.name.clone(),
            experience: profile.experience.clone(),
            skills: profile.skills.clone(),
            target_role: profile.target_role.clone().unwrap_or_default(),
            resume_text: profile.resume_text.clone(),
        }
    }
}
