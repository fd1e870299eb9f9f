//! Server-held interview sessions: the candidate profile, the chosen job, the
//! transcript so far and the phase tracker.
//!
//! The store lock is only held for map operations. Turn handling reads a
//! `TurnPlan`, releases the lock for the provider call, then records the result
//! against the same interview id.
//!
//! A session untouched for the idle timeout is gone: expired entries are dropped
//! on access and by a periodic sweep.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::catalog::JobPosting;
use crate::errors::AppError;
use crate::interview::{InterviewContext, InterviewPhase, InterviewType, PhaseTracker, UserProfile};
use crate::llm_client::ChatMessage;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: Uuid,
    pub profile: UserProfile,
    pub interview: Option<ActiveInterview>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInterview {
    /// Changes on every restart so a turn started before a restart cannot land in the new one.
    pub id: Uuid,
    pub job_id: String,
    pub interview_type: InterviewType,
    pub context: InterviewContext,
    pub phase: InterviewPhase,
    pub question_count: u32,
    pub progress_percent: u32,
    pub complete: bool,
    pub history: Vec<ChatMessage>,
    pub started_at: DateTime<Utc>,
    #[serde(skip)]
    tracker: PhaseTracker,
}

impl ActiveInterview {
    fn new(job: &JobPosting, profile: &UserProfile, interview_type: InterviewType) -> Self {
        let mut interview = Self {
            id: Uuid::new_v4(),
            job_id: job.id.clone(),
            interview_type,
            context: InterviewContext::from_job(job, profile.clone()),
            phase: InterviewPhase::Intro,
            question_count: 0,
            progress_percent: 0,
            complete: false,
            history: Vec::new(),
            started_at: Utc::now(),
            tracker: PhaseTracker::new(),
        };
        interview.sync_progress();
        interview
    }

    fn sync_progress(&mut self) {
        self.phase = self.tracker.phase();
        self.question_count = self.tracker.question_count();
        self.progress_percent = self.tracker.progress_percent();
        self.complete = self.tracker.is_complete();
    }
}

/// Everything a turn needs from the session, copied out so the lock can be released.
#[derive(Debug, Clone)]
pub struct TurnPlan {
    pub interview_id: Uuid,
    pub context: InterviewContext,
    pub interview_type: InterviewType,
    pub phase: InterviewPhase,
    pub history: Vec<ChatMessage>,
}

/// Interview progress after a recorded turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnProgress {
    pub phase: InterviewPhase,
    pub question_count: u32,
    pub complete: bool,
}

struct StoredSession {
    session: InterviewSession,
    last_active: Instant,
}

type SessionMap = HashMap<Uuid, StoredSession>;

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionMap>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_timeout,
        }
    }

    pub async fn create(&self, profile: UserProfile) -> InterviewSession {
        let session = InterviewSession {
            id: Uuid::new_v4(),
            profile,
            interview: None,
            created_at: Utc::now(),
        };
        let stored = StoredSession {
            session: session.clone(),
            last_active: Instant::now(),
        };
        self.inner.write().await.insert(session.id, stored);
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<InterviewSession> {
        let mut sessions = self.inner.write().await;
        self.touch(&mut sessions, id).ok().map(|s| s.clone())
    }

    /// Returns false if there was nothing to remove.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    /// Drops every session idle for at least the timeout. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_active) < self.idle_timeout);
        before - sessions.len()
    }

    /// Runs `evict_idle` every `period` until the returned task is aborted.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle().await;
                if evicted > 0 {
                    info!("Evicted {evicted} idle session(s)");
                }
            }
        })
    }

    /// Looks up a live session and marks it active. An expired one is removed first.
    fn touch<'a>(&self, sessions: &'a mut SessionMap, id: Uuid) -> Result<&'a mut InterviewSession, AppError> {
        let now = Instant::now();
        let expired = sessions
            .get(&id)
            .is_some_and(|s| now.duration_since(s.last_active) >= self.idle_timeout);
        if expired {
            sessions.remove(&id);
        }

        let stored = sessions.get_mut(&id).ok_or_else(session_not_found)?;
        stored.last_active = now;
        Ok(&mut stored.session)
    }

    /// Starts (or restarts) an interview for `job`, discarding any previous transcript.
    pub async fn start_interview(
        &self,
        id: Uuid,
        job: &JobPosting,
        interview_type: InterviewType,
    ) -> Result<InterviewSession, AppError> {
        let mut sessions = self.inner.write().await;
        let session = self.touch(&mut sessions, id)?;
        session.interview = Some(ActiveInterview::new(job, &session.profile, interview_type));
        Ok(session.clone())
    }

    /// Checks that a turn may be taken and snapshots what it needs.
    pub async fn plan_turn(&self, id: Uuid) -> Result<TurnPlan, AppError> {
        let mut sessions = self.inner.write().await;
        let session = self.touch(&mut sessions, id)?;
        let interview = session
            .interview
            .as_ref()
            .ok_or_else(|| AppError::Conflict("No interview has been started".to_string()))?;
        if interview.complete {
            return Err(AppError::Conflict("Interview is already complete".to_string()));
        }

        Ok(TurnPlan {
            interview_id: interview.id,
            context: interview.context.clone(),
            interview_type: interview.interview_type,
            phase: interview.phase,
            history: interview.history.clone(),
        })
    }

    /// Appends the candidate message and the interviewer reply, then counts one question.
    pub async fn record_turn(
        &self,
        id: Uuid,
        interview_id: Uuid,
        user_message: &str,
        reply: &str,
    ) -> Result<TurnProgress, AppError> {
        let mut sessions = self.inner.write().await;
        let session = self.touch(&mut sessions, id)?;
        let interview = session
            .interview
            .as_mut()
            .filter(|i| i.id == interview_id)
            .ok_or_else(|| AppError::Conflict("Interview was restarted during the turn".to_string()))?;

        interview.history.push(ChatMessage::user(user_message));
        interview.history.push(ChatMessage::assistant(reply));
        interview.tracker.record_question();
        interview.sync_progress();

        Ok(TurnProgress {
            phase: interview.phase,
            question_count: interview.question_count,
            complete: interview.complete,
        })
    }
}

fn session_not_found() -> AppError {
    AppError::NotFound("Session not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::JOBS_CSV;
    use crate::catalog::parse_jobs;
    use crate::interview::phase::TOTAL_QUESTIONS;

    fn job() -> JobPosting {
        parse_jobs(JOBS_CSV).unwrap().remove(0)
    }

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(30 * 60))
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Mina".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_turn_requires_interview() {
        let store = store();
        let session = store.create(profile()).await;

        let err = store.plan_turn(session.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = store.plan_turn(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_start_interview_builds_context_from_profile() {
        let store = store();
        let session = store.create(profile()).await;

        let session = store
            .start_interview(session.id, &job(), InterviewType::Technical)
            .await
            .unwrap();
        let interview = session.interview.unwrap();
        assert_eq!(interview.context.company, "Acme");
        assert_eq!(interview.context.user_profile.name, "Mina");
        assert_eq!(interview.phase, InterviewPhase::Intro);
        assert!(interview.history.is_empty());
    }

    #[tokio::test]
    async fn test_turns_advance_phase_until_complete() {
        let store = store();
        let session = store.create(profile()).await;
        store
            .start_interview(session.id, &job(), InterviewType::Standard)
            .await
            .unwrap();

        let mut last = None;
        for i in 0..TOTAL_QUESTIONS {
            let plan = store.plan_turn(session.id).await.unwrap();
            assert_eq!(plan.history.len(), (i * 2) as usize);
            last = Some(
                store
                    .record_turn(session.id, plan.interview_id, "answer", "question?")
                    .await
                    .unwrap(),
            );
        }

        let last = last.unwrap();
        assert_eq!(last.question_count, TOTAL_QUESTIONS);
        assert_eq!(last.phase, InterviewPhase::Closing);
        assert!(last.complete);

        let err = store.plan_turn(session.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_restart_rejects_stale_turn() {
        let store = store();
        let session = store.create(profile()).await;
        store
            .start_interview(session.id, &job(), InterviewType::Standard)
            .await
            .unwrap();
        let plan = store.plan_turn(session.id).await.unwrap();

        store
            .start_interview(session.id, &job(), InterviewType::Personality)
            .await
            .unwrap();
        let err = store
            .record_turn(session.id, plan.interview_id, "late", "reply")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let interview = store.get(session.id).await.unwrap().interview.unwrap();
        assert!(interview.history.is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store();
        let session = store.create(profile()).await;
        assert!(store.remove(session.id).await);
        assert!(!store.remove(session.id).await);
        assert!(store.get(session.id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_keeps_session_alive_and_idle_ones_are_evicted() {
        let store = SessionStore::new(Duration::from_secs(60));
        let idle = store.create(profile()).await;
        let active = store.create(profile()).await;

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(store.get(active.id).await.is_some());
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.evict_idle().await, 1);
        assert!(store.get(idle.id).await.is_none());
        assert!(store.get(active.id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_is_gone_before_any_sweep() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(profile()).await;
        store
            .start_interview(session.id, &job(), InterviewType::Standard)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        let err = store.plan_turn(session.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!store.remove(session.id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_discards_abandoned_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.create(profile()).await;
        store.create(profile()).await;
        let sweeper = store.spawn_sweeper(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(75)).await;
        assert!(store.inner.read().await.is_empty());
        sweeper.abort();
    }
}
