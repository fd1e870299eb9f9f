//! Realtime voice interview: an upstream live-model session plus the browser bridge.
//!
//! - `protocol`: vendor and browser message shapes.
//! - `session`: `LiveSession` connect/send/receive and the per-turn audio accumulator.
//! - `wav`: PCM to WAV packaging.
//! - `handlers`: the `/api/interview/live` WebSocket bridge.

pub mod handlers;
pub mod protocol;
pub mod session;
pub mod wav;
