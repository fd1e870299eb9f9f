//! Token relay: turns an upstream `TokenStream` into browser-facing relay events.
//!
//! The upstream stream is driven by a spawned task that feeds a bounded channel.
//! When the browser disconnects the receiver is dropped, the next send fails, and
//! the task drops the upstream stream with it.

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::llm_client::{ChatProvider, ChatRequest, TokenStream};
use crate::sse::{RelayEvent, TranscriptAssembler, TurnOutcome};

const RELAY_BUFFER: usize = 32;
const KEEP_ALIVE_SECS: u64 = 15;

/// Starts an upstream stream. A request that fails before the first byte becomes a
/// one-item stream carrying that error, so the browser still gets an SSE error frame.
pub async fn open_token_stream(provider: &dyn ChatProvider, request: &ChatRequest) -> TokenStream {
    match provider.stream(request).await {
        Ok(tokens) => tokens,
        Err(e) => Box::pin(futures_util::stream::once(async move { Err::<String, _>(e) })),
    }
}

/// Relays tokens without observing the outcome.
pub fn relay_stream(tokens: TokenStream) -> ReceiverStream<RelayEvent> {
    relay_turn(tokens, |_| async {})
}

/// Relays tokens and hands the assembled outcome to `on_outcome` once the turn ends.
///
/// Emits one token event per non-empty increment, then a done event stamped with the
/// server clock. An upstream error emits exactly one error event and stops.
/// `on_outcome` sees `TurnOutcome::Failed` if the browser went away first.
pub fn relay_turn<F, Fut>(mut tokens: TokenStream, on_outcome: F) -> ReceiverStream<RelayEvent>
where
    F: FnOnce(TurnOutcome) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);

    tokio::spawn(async move {
        let mut assembler = TranscriptAssembler::new();

        loop {
            let event = match tokens.next().await {
                Some(Ok(text)) if text.is_empty() => continue,
                Some(Ok(text)) => RelayEvent::token(text),
                Some(Err(e)) => {
                    warn!("Upstream stream failed: {e}");
                    RelayEvent::error(e.to_string())
                }
                None => RelayEvent::done(Utc::now()),
            };

            let terminal = event.is_terminal();
            if tx.send(event.clone()).await.is_err() {
                debug!("Client disconnected mid-stream; dropping upstream");
                break;
            }
            // Only events the client was handed count toward the outcome.
            assembler.apply(&event);
            if terminal {
                break;
            }
        }

        on_outcome(assembler.finish()).await;
    });

    ReceiverStream::new(rx)
}

/// Wraps relay events as an SSE response body.
pub fn sse_response(
    events: ReceiverStream<RelayEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = events.map(|event| Ok(Event::default().data(event.to_json())));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_SECS)))
}
