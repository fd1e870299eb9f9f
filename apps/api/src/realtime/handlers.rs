use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use futures_util::stream::SplitSink;
use futures_util::{Sink, SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::interview::{InterviewContext, InterviewPhase};
use crate::realtime::protocol::{BridgeFrame, BrowserFrame};
use crate::realtime::session::{LiveConfig, LiveError, LiveEvent, LiveSender, LiveSession};
use crate::state::AppState;

type BrowserSink = SplitSink<WebSocket, Message>;

/// GET /api/interview/live
///
/// Bridges a browser WebSocket to one upstream live session.
pub async fn handle_live(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_bridge(socket, state))
}

async fn run_bridge(mut socket: WebSocket, state: AppState) {
    let Some((context, phase)) = wait_for_start(&mut socket).await else {
        return;
    };

    let Some(config) = LiveConfig::from_config(&state.config) else {
        fail_and_close(socket, "Gemini API key not configured").await;
        return;
    };

    let session = match LiveSession::connect(&config, &context, phase).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Live session failed to connect: {e}");
            fail_and_close(socket, &e.to_string()).await;
            return;
        }
    };

    let (mut browser_tx, mut browser_rx) = socket.split();
    if send_frame(&mut browser_tx, &BridgeFrame::Ready).await.is_err() {
        return;
    }
    let (mut upstream_tx, mut upstream_rx) = session.split();

    loop {
        tokio::select! {
            incoming = browser_rx.next() => {
                let keep_going = match incoming {
                    Some(Ok(message)) => forward_to_upstream(message, &mut upstream_tx, &mut browser_tx).await,
                    Some(Err(e)) => {
                        debug!("Browser socket error: {e}");
                        false
                    }
                    None => false,
                };
                if !keep_going {
                    break;
                }
            }
            events = upstream_rx.next_events() => {
                if !forward_to_browser(events, &mut browser_tx).await {
                    break;
                }
            }
        }
    }

    upstream_tx.close().await;
    let _ = browser_tx.close().await;
    info!("Live bridge closed");
}

/// Reads frames until the browser sends `start`. Returns `None` if it leaves first.
async fn wait_for_start(socket: &mut WebSocket) -> Option<(InterviewContext, InterviewPhase)> {
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<BrowserFrame>(&text) {
                Ok(BrowserFrame::Start { context, phase }) => return Some((context, phase)),
                Ok(other) => debug!("Ignoring {other:?} before start"),
                Err(e) => warn!("Unreadable frame before start: {e}"),
            },
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

/// Returns false when the bridge should end.
async fn forward_to_upstream(
    message: Message,
    upstream: &mut LiveSender,
    browser: &mut BrowserSink,
) -> bool {
    let result = match message {
        Message::Text(text) => match serde_json::from_str::<BrowserFrame>(&text) {
            Ok(BrowserFrame::Text { text }) => upstream.send_text(&text).await,
            Ok(BrowserFrame::Phase { phase }) => upstream.update_phase(phase).await,
            Ok(BrowserFrame::Audio { data }) => match BASE64_STANDARD.decode(&data) {
                Ok(pcm) => upstream.send_audio(&pcm).await,
                Err(e) => {
                    warn!("Dropping undecodable audio turn: {e}");
                    Ok(())
                }
            },
            Ok(BrowserFrame::Start { .. }) => {
                debug!("Ignoring repeated start");
                Ok(())
            }
            Err(e) => {
                warn!("Unreadable browser frame: {e}");
                Ok(())
            }
        },
        Message::Binary(pcm) => upstream.stream_audio(&pcm).await,
        Message::Close(_) => return false,
        Message::Ping(_) | Message::Pong(_) => Ok(()),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Upstream send failed: {e}");
            let _ = send_frame(browser, &BridgeFrame::fallback(e.to_string())).await;
            false
        }
    }
}

/// Returns false when the bridge should end.
async fn forward_to_browser<S>(events: Option<Result<Vec<LiveEvent>, LiveError>>, browser: &mut S) -> bool
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let events = match events {
        Some(Ok(events)) => events,
        Some(Err(e)) => {
            warn!("Upstream receive failed: {e}");
            let _ = send_frame(browser, &BridgeFrame::fallback(e.to_string())).await;
            return false;
        }
        None => {
            info!("Upstream closed the live session");
            return false;
        }
    };

    for event in events {
        let sent = match event {
            LiveEvent::Text(text) => send_frame(browser, &BridgeFrame::Text { text }).await,
            LiveEvent::Audio(wav) => browser.send(Message::Binary(wav)).await,
            LiveEvent::TurnComplete => send_frame(browser, &BridgeFrame::TurnComplete).await,
            LiveEvent::AudioDropped(reason) => {
                warn!("Dropped an audio fragment from the live model: {reason}");
                Ok(())
            }
            LiveEvent::Error(message) => {
                warn!("Live model error: {message}");
                let _ = send_frame(browser, &BridgeFrame::fallback(message)).await;
                return false;
            }
        };
        if sent.is_err() {
            return false;
        }
    }
    true
}

async fn send_frame<S>(browser: &mut S, frame: &BridgeFrame) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    browser.send(Message::Text(json)).await
}

/// Sends the fallback frame and closes. The browser switches to the streamed interview.
async fn fail_and_close(mut socket: WebSocket, message: &str) {
    if let Ok(json) = serde_json::to_string(&BridgeFrame::fallback(message)) {
        let _ = socket.send(Message::Text(json)).await;
    }
    let _ = socket.close().await;
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures_util::sink::SinkMapErr;

    use super::*;

    type RecordingBrowser = SinkMapErr<Vec<Message>, fn(Infallible) -> axum::Error>;

    fn unreachable_error(never: Infallible) -> axum::Error {
        match never {}
    }

    fn recording_browser() -> RecordingBrowser {
        Vec::new().sink_map_err(unreachable_error as fn(Infallible) -> axum::Error)
    }

    fn texts(browser: &RecordingBrowser) -> Vec<String> {
        browser
            .get_ref()
            .iter()
            .filter_map(|m| match m {
                Message::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_dropped_audio_keeps_the_bridge_open() {
        let mut browser = recording_browser();
        let events = vec![
            LiveEvent::AudioDropped("Invalid symbol".to_string()),
            LiveEvent::Text("Tell me about yourself.".to_string()),
            LiveEvent::TurnComplete,
        ];

        assert!(forward_to_browser(Some(Ok(events)), &mut browser).await);
        let sent = texts(&browser);
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("Tell me about yourself."));
        assert!(sent[1].contains("turn_complete"));
    }

    #[tokio::test]
    async fn test_model_error_sends_fallback_and_ends_bridge() {
        let mut browser = recording_browser();
        let events = vec![
            LiveEvent::Error("quota exceeded".to_string()),
            LiveEvent::Text("never sent".to_string()),
        ];

        assert!(!forward_to_browser(Some(Ok(events)), &mut browser).await);
        let sent = texts(&browser);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("quota exceeded"));
        assert!(sent[0].contains(r#""fallback":"stream""#));
    }

    #[tokio::test]
    async fn test_audio_goes_down_as_binary() {
        let mut browser = recording_browser();
        assert!(forward_to_browser(Some(Ok(vec![LiveEvent::Audio(vec![1, 2])])), &mut browser).await);
        assert!(matches!(&browser.get_ref()[..], [Message::Binary(wav)] if wav == &vec![1u8, 2]));

        assert!(!forward_to_browser(None, &mut browser).await);
    }
}
