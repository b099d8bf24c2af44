use super::adapter::{SnapshotSource, StreamAdapter, StreamSettings};
use crate::membership::service::FleetView;
use crate::tasks::registry::TaskRegistry;

use axum::Extension;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt, future};

pub async fn handle_ws_nodes(
    ws: WebSocketUpgrade,
    Extension(fleet): Extension<FleetView>,
    Extension(settings): Extension<StreamSettings>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(socket, fleet, settings))
}

pub async fn handle_ws_tasks(
    ws: WebSocketUpgrade,
    Extension(registry): Extension<TaskRegistry>,
    Extension(settings): Extension<StreamSettings>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_socket(socket, registry, settings))
}

async fn serve_socket<S: SnapshotSource>(socket: WebSocket, source: S, settings: StreamSettings) {
    let (sender, mut receiver) = socket.split();
    let closed = settings.shutdown.child_token();

    // Inbound frames are ignored; the reader only watches for the peer going away.
    let reader_closed = closed.clone();
    let reader = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            }
        }
        reader_closed.cancel();
    });

    let sink = sender.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text))));

    StreamAdapter::new(source, settings.interval)
        .run(sink, closed.clone())
        .await;

    closed.cancel();
    reader.abort();
}
