//! Server-Sent Events support

use crate::runtime::AssistantEvent;
use crate::session::SessionSnapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init: SessionSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<AssistantEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with the snapshot then broadcasts
    let init = futures::stream::once(async move { Ok(init_event(&init)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(assistant_event_to_axum(&event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn init_event(snapshot: &SessionSnapshot) -> Event {
    let data = json!({
        "type": "init",
        "snapshot": snapshot,
    });
    Event::default().event("init").data(data.to_string())
}

fn assistant_event_to_axum(event: &AssistantEvent) -> Event {
    Event::default()
        .event(event.name())
        .data(event_payload(event).to_string())
}

/// JSON body of an event. Appended messages also carry their text split
/// into paragraphs so clients need not parse line breaks themselves.
fn event_payload(event: &AssistantEvent) -> Value {
    let mut data = serde_json::to_value(event).unwrap_or_else(|e| {
        json!({ "type": "error", "message": format!("Failed to encode event: {e}") })
    });
    if let AssistantEvent::MessageAppended { message } = event {
        data["paragraphs"] = json!(message.paragraphs().collect::<Vec<_>>());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, MessageDraft};

    #[test]
    fn test_appended_message_carries_paragraphs() {
        let message = Message::from_draft(
            MessageDraft::assistant("Growth offers attribution.\n\nScale adds warehousing."),
            Duration::from_millis(500),
        );
        let data = event_payload(&AssistantEvent::MessageAppended { message });
        assert_eq!(data["type"], "message_appended");
        assert_eq!(
            data["paragraphs"],
            json!(["Growth offers attribution.", "Scale adds warehousing."])
        );
        assert_eq!(data["message"]["delay_ms"], 500);
    }

    #[test]
    fn test_other_events_have_no_paragraphs() {
        let data = event_payload(&AssistantEvent::LogCleared);
        assert_eq!(data, json!({ "type": "log_cleared" }));
    }
}
