// Prompt templates for the interview endpoints.
// Cross-cutting fragments live in llm_client::prompts.

use crate::catalog::JobPosting;
use crate::interview::context::{CandidateProfile, InterviewContext, InterviewType, JobData};
use crate::interview::phase::InterviewPhase;
use crate::llm_client::prompts::{AUDIENCE_NOTE, INTERVIEWER_RULES, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{ChatMessage, ChatRole};

const CHAT_RESUME_CHARS: usize = 500;
const LIVE_RESUME_CHARS: usize = 1000;
const STREAM_RESUME_CHARS: usize = 2000;
const STREAM_RESPONSIBILITIES: usize = 3;

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

fn joined_or(items: &[String], take: usize, sep: &str, default: &str) -> String {
    if items.is_empty() {
        default.to_string()
    } else {
        items.iter().take(take).cloned().collect::<Vec<_>>().join(sep)
    }
}

/// Job and candidate block shared by the one-shot and live interviewer prompts.
fn context_block(context: &InterviewContext, resume_chars: usize) -> String {
    let profile = &context.user_profile;
    let resume = profile
        .resume_text
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!("\n- Resume Summary: {}", truncate_chars(r, resume_chars)))
        .unwrap_or_default();

    format!(
        "**Job Details:**
- Position: {title}
- Company: {company}
- Key Skills: {skills}
- Responsibilities: {responsibilities}

**Candidate Profile:**
- Name: {name}
- Nationality: {nationality}
- Experience: {experience} years
- Skills: {candidate_skills}{resume}",
        title = or_default(&context.job_title, "Not specified"),
        company = or_default(&context.company, "Not specified"),
        skills = joined_or(&context.skills, usize::MAX, ", ", "General skills"),
        responsibilities = joined_or(&context.responsibilities, 3, "; ", "Various responsibilities"),
        name = or_default(&profile.name, "Candidate"),
        nationality = or_default(profile.nationality.as_deref().unwrap_or(""), "Not specified"),
        experience = or_default(&profile.experience, "0"),
        candidate_skills = or_default(&profile.skills, "Not specified"),
    )
}

/// System prompt for the one-shot interviewer.
pub fn interview_system_prompt(context: &InterviewContext, phase: InterviewPhase) -> String {
    format!(
        "You are an expert Korean HR interviewer conducting an interview in English for a {title} at {company}.

{context}

**Interview Phase:** {phase}

**Instructions:**
{rules}
- For the technical phase: focus on skills and experience
- For the behavioral phase: use STAR method questions

**Current Phase Guidelines:**
{guidelines}

{audience}",
        title = or_default(&context.job_title, "position"),
        company = or_default(&context.company, "the company"),
        context = context_block(context, CHAT_RESUME_CHARS),
        phase = phase.as_str(),
        rules = INTERVIEWER_RULES,
        guidelines = phase.guidelines(),
        audience = AUDIENCE_NOTE,
    )
}

/// System instruction negotiated once when a realtime session connects.
pub fn live_system_instruction(context: &InterviewContext, phase: InterviewPhase) -> String {
    format!(
        "You are an expert Korean HR interviewer conducting a spoken interview in English for a {title} at {company}.

{context}

**Interview Phase:** {phase}

**Communication Style:**
{rules}
- Speak clearly and at a moderate pace; English may not be the candidate's first language

**Phase Guidelines:**
{guidelines}

{audience}",
        title = or_default(&context.job_title, "position"),
        company = or_default(&context.company, "the company"),
        context = context_block(context, LIVE_RESUME_CHARS),
        phase = phase.as_str().to_uppercase(),
        rules = INTERVIEWER_RULES,
        guidelines = phase.guidelines(),
        audience = AUDIENCE_NOTE,
    )
}

fn interview_type_instructions(interview_type: InterviewType, skills: &[String]) -> String {
    match interview_type {
        InterviewType::Personality => "**Interview type: Personality interview**

Assess the candidate's character, values, behavior, and culture fit.

**Question categories:**
1. Teamwork and collaboration
2. Conflict resolution
3. Leadership experience
4. Stress management
5. Failure and learning
6. Ethical dilemmas
7. Company culture fit
8. Long-term career goals

**Question style:**
- \"Tell me about a time when...\", \"How did you handle...\"
- Guide answers toward STAR (Situation, Task, Action, Result)
- Focus on past experience and behavior patterns
- Open-ended, at most 2-3 sentences per question"
            .to_string(),
        InterviewType::Technical | InterviewType::Standard => format!(
            "**Interview type: Technical interview**

Assess technical ability, problem solving, and hands-on experience.

**Question categories:**
1. Experience with the stack ({skills})
2. System architecture and design
3. Problem-solving approach
4. Code quality and optimization
5. Debugging and troubleshooting
6. Current technology trends and best practices
7. Tools and methodology
8. Technical decision making

**Question style:**
- \"How did you implement...\", \"Why did you choose...\", \"How would you optimize...\"
- Ask for concrete details, metrics, and results
- Challenge technology choices and ask about trade-offs
- At most 2-3 sentences per question",
            skills = skills.join(", "),
        ),
    }
}

/// System message for the streamed interviewer.
pub fn streaming_system_prompt(
    interview_type: InterviewType,
    job: &JobData,
    profile: &CandidateProfile,
) -> String {
    let resume = profile
        .resume_text
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|r| truncate_chars(r, STREAM_RESUME_CHARS).to_string())
        .unwrap_or_else(|| {
            "No resume provided. Use the skills and experience above.".to_string()
        });

    format!(
        "You are a professional HR interviewer running an interview for the {title} position at {company}.

{type_instructions}

**Job posting:**
{description}

**Required skills:**
{skills}

**Key responsibilities:**
{responsibilities}

**Candidate:**
- Name: {name}
- Experience: {experience} years
- Skills: {candidate_skills}
- Target role: {target_role}

**Resume:**
{resume}

**How to run the interview:**
{rules}
- Ask follow-up questions based on the candidate's answers
- Raise the difficulty gradually
- Cover the areas that match the interview type

**Important:**
- This is practice for entering the Korean job market; be supportive and encouraging
- Ask for concrete examples drawn from real experience
- Conduct every question and answer in Korean",
        title = job.title,
        company = job.company,
        type_instructions = interview_type_instructions(interview_type, &job.skills),
        description = or_default(&job.description, "No information"),
        skills = joined_or(&job.skills, usize::MAX, ", ", "Not specified"),
        responsibilities = joined_or(&job.responsibilities, STREAM_RESPONSIBILITIES, "\n", "Not specified"),
        name = or_default(&profile.full_name, "Candidate"),
        experience = or_default(&profile.experience, "0"),
        candidate_skills = or_default(&profile.skills, "Not specified"),
        target_role = or_default(&profile.target_role, "Not specified"),
        rules = INTERVIEWER_RULES,
    )
}

/// Prompt asking for a structured feedback report over a finished transcript.
pub fn feedback_prompt(context: &InterviewContext, history: &[ChatMessage]) -> String {
    let conversation = history
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| {
            let speaker = if m.role == ChatRole::User {
                "Candidate"
            } else {
                "Interviewer"
            };
            format!("{speaker}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an expert interview coach. Analyze this interview conversation and provide detailed feedback.

**Job Position:** {title} at {company}

**Conversation:**
{conversation}

Provide comprehensive feedback as a JSON object with this schema:
{{
  "overallScore": number (0-100),
  "categories": [
    {{
      "name": "Communication Skills",
      "score": number (0-100),
      "feedback": ["point 1", "point 2"],
      "strengths": ["strength 1"],
      "improvements": ["improvement 1"]
    }}
  ],
  "keyStrengths": ["strength 1", "strength 2", "strength 3"],
  "areasForImprovement": ["area 1", "area 2", "area 3"],
  "recommendations": ["recommendation 1", "recommendation 2", "recommendation 3"]
}}

Use exactly these four categories: Communication Skills, Technical Knowledge, Problem Solving, Cultural Fit.
Be specific, constructive, and encouraging."#,
        title = context.job_title,
        company = context.company,
    )
}

/// System prompt for interview-guide generation.
pub fn guide_system_prompt() -> String {
    format!(
        r#"You are a Korean interview coach who creates actionable preparation guides for foreign candidates.
Your response must be a JSON object with the following structure:
{{
  "jobOverview": string,
  "companyInsight": string,
  "keyCompetencies": string[],
  "preparationTimeline": [
    {{ "phase": string, "focus": string, "actions": string[] }}
  ],
  "practiceQuestions": [
    {{ "question": string, "whyItMatters": string, "howToAnswer": string }}
  ],
  "bonusTips": string[]
}}

- Keep the tone encouraging and concise.
- Tailor the content to the given job description and required skills.
- Provide 4-6 key competencies, 3-4 timeline steps, and 4-5 practice questions.
- Use Korean throughout.

{json_only}"#,
        json_only = JSON_ONLY_INSTRUCTION,
    )
}

/// User message listing the job facts the guide is built from.
pub fn guide_user_prompt(job: &JobPosting) -> String {
    format!(
        "Job Title: {title}
Company: {company}
Role Category: {role}

Responsibilities:
{responsibilities}

Required Qualifications:
{required}

Preferred Qualifications:
{preferred}

Key Skills:
{skills}

Job Description:
{description}",
        title = job.title,
        company = job.company,
        role = job.role_category,
        responsibilities = job.responsibilities.join("\n"),
        required = job.required.join("\n"),
        preferred = job.preferred.join("\n"),
        skills = job.skills.join(", "),
        description = job.description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::context::UserProfile;

    fn sample_context() -> InterviewContext {
        InterviewContext {
            job_title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            responsibilities: vec![
                "Design APIs".to_string(),
                "Run on-call".to_string(),
                "Mentor juniors".to_string(),
                "Write docs".to_string(),
            ],
            skills: vec!["Go".to_string(), "Rust".to_string()],
            user_profile: UserProfile {
                name: "Mina".to_string(),
                experience: "4".to_string(),
                resume_text: Some("x".repeat(800)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("안녕하세요", 2), "안녕");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_interview_prompt_includes_phase_and_facts() {
        let prompt = interview_system_prompt(&sample_context(), InterviewPhase::Technical);
        assert!(prompt.contains("Backend Engineer at Acme"));
        assert!(prompt.contains("**Interview Phase:** technical"));
        assert!(prompt.contains("Key Skills: Go, Rust"));
        assert!(prompt.contains("Responsibilities: Design APIs; Run on-call; Mentor juniors"));
        assert!(!prompt.contains("Write docs"));
        assert!(prompt.contains(InterviewPhase::Technical.guidelines()));
        // Resume truncated to 500 chars.
        assert!(prompt.contains(&"x".repeat(500)));
        assert!(!prompt.contains(&"x".repeat(501)));
    }

    #[test]
    fn test_interview_prompt_defaults_for_empty_context() {
        let prompt = interview_system_prompt(&InterviewContext::default(), InterviewPhase::Intro);
        assert!(prompt.contains("for a position at the company"));
        assert!(prompt.contains("Name: Candidate"));
        assert!(prompt.contains("Key Skills: General skills"));
        assert!(!prompt.contains("Resume Summary"));
    }

    #[test]
    fn test_live_instruction_uppercases_phase() {
        let prompt = live_system_instruction(&sample_context(), InterviewPhase::Closing);
        assert!(prompt.contains("**Interview Phase:** CLOSING"));
    }

    #[test]
    fn test_streaming_prompt_selects_type_catalogue() {
        let job = JobData::from(&sample_context());
        let profile = CandidateProfile::default();

        let personality = streaming_system_prompt(InterviewType::Personality, &job, &profile);
        assert!(personality.contains("Personality interview"));
        assert!(personality.contains("No resume provided"));

        let standard = streaming_system_prompt(InterviewType::Standard, &job, &profile);
        assert!(standard.contains("Technical interview"));
        assert!(standard.contains("Experience with the stack (Go, Rust)"));
    }

    #[test]
    fn test_feedback_prompt_labels_speakers() {
        let history = vec![
            ChatMessage::assistant("Tell me about yourself."),
            ChatMessage::user("I build backends."),
        ];
        let prompt = feedback_prompt(&sample_context(), &history);
        assert!(prompt.contains("Interviewer: Tell me about yourself."));
        assert!(prompt.contains("Candidate: I build backends."));
        assert!(prompt.contains("\"overallScore\""));
    }
}
