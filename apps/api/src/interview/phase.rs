//! Interview phase progression as a pure function of how many questions have been asked.

use serde::{Deserialize, Serialize};

/// Questions in a full mock interview.
pub const TOTAL_QUESTIONS: u32 = 8;

const TECHNICAL_FROM: u32 = 3;
const BEHAVIORAL_FROM: u32 = 5;
const CLOSING_FROM: u32 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewPhase {
    #[default]
    Intro,
    Technical,
    Behavioral,
    Closing,
}

impl InterviewPhase {
    /// Phase for a given number of questions asked so far.
    pub fn for_question_count(count: u32) -> Self {
        match count {
            c if c >= CLOSING_FROM => InterviewPhase::Closing,
            c if c >= BEHAVIORAL_FROM => InterviewPhase::Behavioral,
            c if c >= TECHNICAL_FROM => InterviewPhase::Technical,
            _ => InterviewPhase::Intro,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewPhase::Intro => "intro",
            InterviewPhase::Technical => "technical",
            InterviewPhase::Behavioral => "behavioral",
            InterviewPhase::Closing => "closing",
        }
    }

    /// Interviewer guidance for the phase, injected into the system prompt.
    pub fn guidelines(&self) -> &'static str {
        match self {
            InterviewPhase::Intro => {
                "- Welcome the candidate warmly\n\
                 - Ask them to introduce themselves briefly\n\
                 - Show genuine interest in their background\n\
                 - Transition naturally to the main interview"
            }
            InterviewPhase::Technical => {
                "- Ask about specific technical skills from their resume\n\
                 - Probe into past projects and experiences\n\
                 - Ask how they would solve relevant problems\n\
                 - Assess their knowledge depth"
            }
            InterviewPhase::Behavioral => {
                "- Use the STAR method (Situation, Task, Action, Result)\n\
                 - Ask about teamwork, challenges, and leadership\n\
                 - Explore cultural fit and adaptability\n\
                 - Understand their motivations"
            }
            InterviewPhase::Closing => {
                "- Ask if they have questions about the role or company\n\
                 - Discuss next steps\n\
                 - Thank them for their time\n\
                 - End on a positive note"
            }
        }
    }
}

impl std::fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic question counter. Only moves forward; a new interview needs a new tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTracker {
    question_count: u32,
}

/// Result of recording one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseUpdate {
    pub phase: InterviewPhase,
    pub changed: bool,
    pub complete: bool,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    pub fn phase(&self) -> InterviewPhase {
        InterviewPhase::for_question_count(self.question_count)
    }

    pub fn is_complete(&self) -> bool {
        self.question_count >= TOTAL_QUESTIONS
    }

    /// Percentage of the interview done, capped at 100.
    pub fn progress_percent(&self) -> u32 {
        (self.question_count.min(TOTAL_QUESTIONS) * 100) / TOTAL_QUESTIONS
    }

    /// Counts one more question asked by the interviewer.
    pub fn record_question(&mut self) -> PhaseUpdate {
        let before = self.phase();
        self.question_count = self.question_count.saturating_add(1);
        let phase = self.phase();
        PhaseUpdate {
            phase,
            changed: phase != before,
            complete: self.is_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let expected = [
            (0, InterviewPhase::Intro),
            (2, InterviewPhase::Intro),
            (3, InterviewPhase::Technical),
            (4, InterviewPhase::Technical),
            (5, InterviewPhase::Behavioral),
            (6, InterviewPhase::Behavioral),
            (7, InterviewPhase::Closing),
            (8, InterviewPhase::Closing),
            (20, InterviewPhase::Closing),
        ];
        for (count, phase) in expected {
            assert_eq!(InterviewPhase::for_question_count(count), phase, "count {count}");
        }
    }

    #[test]
    fn test_tracker_walks_all_phases_forward() {
        let mut tracker = PhaseTracker::new();
        let mut changes = Vec::new();
        let mut completed_at = None;

        for _ in 0..TOTAL_QUESTIONS {
            let update = tracker.record_question();
            if update.changed {
                changes.push((tracker.question_count(), update.phase));
            }
            if update.complete && completed_at.is_none() {
                completed_at = Some(tracker.question_count());
            }
        }

        assert_eq!(
            changes,
            vec![
                (3, InterviewPhase::Technical),
                (5, InterviewPhase::Behavioral),
                (7, InterviewPhase::Closing),
            ]
        );
        assert_eq!(completed_at, Some(8));
    }

    #[test]
    fn test_phase_never_moves_backward() {
        let mut tracker = PhaseTracker::new();
        let mut last = tracker.phase();
        for _ in 0..12 {
            let update = tracker.record_question();
            assert!(update.phase >= last);
            last = update.phase;
        }
    }

    #[test]
    fn test_progress_is_capped() {
        let mut tracker = PhaseTracker::new();
        assert_eq!(tracker.progress_percent(), 0);
        for _ in 0..4 {
            tracker.record_question();
        }
        assert_eq!(tracker.progress_percent(), 50);
        for _ in 0..10 {
            tracker.record_question();
        }
        assert_eq!(tracker.progress_percent(), 100);
    }

    #[test]
    fn test_phase_wire_names() {
        assert_eq!(
            serde_json::to_string(&InterviewPhase::Behavioral).unwrap(),
            r#""behavioral""#
        );
        let phase: InterviewPhase = serde_json::from_str(r#""intro""#).unwrap();
        assert_eq!(phase, InterviewPhase::Intro);
    }
}
