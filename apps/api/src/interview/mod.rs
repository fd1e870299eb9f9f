//! Mock interview flow: prompt assembly, chat turns, guides, feedback and the SSE relay.

pub mod chat;
pub mod context;
pub mod feedback;
pub mod guide;
pub mod handlers;
pub mod phase;
pub mod prompts;
pub mod relay;

pub use context::{InterviewContext, InterviewType, UserProfile};
pub use phase::{InterviewPhase, PhaseTracker};
