use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use fedgate_core::LifecycleEvent;
use futures::stream::Stream;
use tokio_stream::StreamExt;

use super::AppState;

/// `GET /v1/events` -- subscribe to the lifecycle event bus (C1) via SSE.
///
/// Each connection gets its own subscriber queue (§4.1); a client that
/// falls behind observes a gap rather than this endpoint blocking the
/// publisher for every other subscriber.
pub async fn subscribe(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = state.service.subscribe_events();
    let sse_stream = events.map(|event: LifecycleEvent| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_owned());
        Ok(Event::default().event(event_name(&event)).data(data))
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}

fn event_name(event: &LifecycleEvent) -> &'static str {
    match event.event_type {
        fedgate_core::EventType::GatewayAdded => "gateway_added",
        fedgate_core::EventType::GatewayUpdated => "gateway_updated",
        fedgate_core::EventType::GatewayActivated => "gateway_activated",
        fedgate_core::EventType::GatewayDeactivated => "gateway_deactivated",
        fedgate_core::EventType::GatewayDeleted => "gateway_deleted",
        fedgate_core::EventType::GatewayRemoved => "gateway_removed",
    }
}
