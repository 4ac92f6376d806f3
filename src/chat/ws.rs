use std::sync::{Arc, Mutex};

use axum::{debug_handler, extract::{State, WebSocketUpgrade}, response::IntoResponse};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::coordinator::Coordinator;
use super::events::ClientEvent;
use super::hub::Hub;

#[debug_handler(state = crate::AppState)]
pub async fn chat_ws(
    State(hub): State<Hub>,
    State(coordinator): State<Arc<Coordinator>>,

    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(async move |stream| {
        let conn_id = Uuid::now_v7();
        let mut rx = hub.subscribe();
        let (mut sender, mut receiver) = stream.split();

        // Which user this connection joined as; shared with the forward
        // task so it can filter user-addressed envelopes.
        let joined_as = Arc::new(Mutex::new(None::<Uuid>));

        let forward_joined = joined_as.clone();
        let forward_task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        let user_id = *forward_joined.lock().unwrap();
                        if !envelope.is_for(conn_id, user_id) {
                            continue;
                        }

                        let Ok(text) = serde_json::to_string(&envelope.event) else {
                            continue;
                        };
                        if sender.send(text.into()).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%conn_id, skipped, "dropping lagged events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        while let Some(Ok(frame)) = receiver.next().await {
            let Ok(event) = serde_json::from_slice::<ClientEvent>(&frame.into_data()) else {
                tracing::debug!(%conn_id, "skipping unparseable frame");
                continue;
            };

            if let ClientEvent::Join { user_id } = &event {
                *joined_as.lock().unwrap() = Some(*user_id);
            }

            coordinator.handle(conn_id, event).await;
        }

        coordinator.disconnect(conn_id);
        forward_task.abort();
    })
}
