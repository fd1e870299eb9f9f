//! Server-Sent Events plumbing shared by the upstream provider streams and the
//! browser-facing relay.
//!
//! - `frame`: the relay's payload shapes (`{token}`, `{done, timestamp}`, `{error}`).
//! - `decoder`: incremental accumulate-until-blank-line parser for raw SSE bytes.
//! - `assembler`: folds relay events back into one typed turn outcome.

pub mod assembler;
pub mod decoder;
pub mod frame;

pub use assembler::{TranscriptAssembler, TurnOutcome};
pub use decoder::{SseDecoder, SseFrame};
pub use frame::RelayEvent;
