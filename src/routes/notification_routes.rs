//! Transporte SSE del NotificationHub
//!
//! Cada conductor conectado mantiene exactamente un stream; el primer
//! evento siempre es el ack "connected". Al cortarse la conexión el
//! receiver se suelta y el hub limpia la suscripción en el siguiente
//! publish.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::stream::Stream;
use std::convert::Infallible;
use uuid::Uuid;

use crate::state::AppState;

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/subscribe/:driver_id", get(subscribe).delete(unsubscribe))
}

async fn subscribe(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.hub.subscribe(driver_id).await;

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        let dispatch_event = rx.recv().await?;
        let sse_event = Event::default()
            .event(dispatch_event.event.clone())
            .json_data(&dispatch_event)
            .unwrap_or_else(|_| Event::default().data("{}"));
        Some((Ok::<_, Infallible>(sse_event), rx))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn unsubscribe(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Json<serde_json::Value> {
    let removed = state.hub.unsubscribe(driver_id).await;
    Json(serde_json::json!({
        "success": true,
        "removed": removed,
    }))
}
