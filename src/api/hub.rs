use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use poem::{
    IntoResponse, handler,
    web::{
        Data, Query,
        websocket::{Message, WebSocket},
    },
};
use serde::Deserialize;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct HubParams {
    token: String,
}

/// Websocket for live notifications. Browsers cannot set headers here, so the token rides in the query.
#[handler]
pub async fn notifications_ws(
    ws: WebSocket,
    Query(params): Query<HubParams>,
    state: Data<&Arc<AppState>>,
) -> poem::Result<impl IntoResponse> {
    let user = state.authenticate(&params.token).await?;
    let hub = state.hub.clone();

    Ok(ws.on_upgrade(move |socket| async move {
        let (mut sink, mut stream) = socket.split();
        let (connection_id, mut rx) = hub.subscribe(user.id).await;

        loop {
            tokio::select! {
                outgoing = rx.recv() => {
                    let Some(message) = outgoing else { break };
                    let text = match serde_json::to_string(&message) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::error!(error = %err, "failed to encode hub message");
                            continue;
                        }
                    };
                    if let Err(err) = sink.send(Message::Text(text)).await {
                        tracing::error!(user_id = user.id, error = %err, "hub send failed");
                        break;
                    }
                }
                incoming = stream.next() => {
                    match incoming {
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
            }
        }

        hub.unsubscribe(user.id, connection_id).await;
    }))
}
