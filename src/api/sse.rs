//! Server-Sent Events support

use crate::runtime::SseEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Stream the initial view, then every session update
pub fn sse_stream(
    init_event: SseEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(event),
        Err(e) => {
            // Every view event is a full snapshot, so the next one catches up
            tracing::debug!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    let events = stream::once(async move { init_event })
        .chain(updates)
        .map(|event| Ok(to_axum_event(&event)));

    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("ping"))
}

fn to_axum_event(event: &SseEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::error!(error = %e, event = event.name(), "Failed to serialize SSE event");
        r#"{"type":"error","message":"Failed to encode update"}"#.to_string()
    });

    Event::default().event(event.name()).data(data)
}
