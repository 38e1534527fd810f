//! Connection Session Module
//!
//! Per-client message loop: decodes framed requests, drives the cache
//! engine or the subscription registry, and serializes both responses and
//! asynchronous notifications onto the same socket.
//!
//! The write half is shared behind a mutex between the request loop and a
//! notification writer task, so a response and a concurrently pushed
//! notification can never interleave on the wire.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::Result;
use crate::events::{CacheEvent, EventType, SubscriptionRegistry};
use crate::models::{CacheRequest, CacheResponse};
use crate::server::codec;

/// Runs one client session to completion.
///
/// Exits on end-of-stream, a transport error, a malformed frame, or the
/// shutdown signal; the client is deregistered on every path.
pub async fn handle_connection(
    client_id: u64,
    stream: TcpStream,
    cache: Arc<RwLock<CacheStore>>,
    registry: Arc<SubscriptionRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let (mut reader, writer) = stream.into_split();
    let writer = Arc::new(Mutex::new(writer));

    let (notif_tx, notif_rx) = mpsc::unbounded_channel();
    registry.add_client(client_id, notif_tx).await;
    let notif_handle = tokio::spawn(forward_notifications(
        client_id,
        notif_rx,
        writer.clone(),
        registry.clone(),
    ));

    let mut buffer = BytesMut::with_capacity(4096);

    'session: loop {
        // Drain every complete frame already buffered before reading again
        loop {
            match codec::decode_frame(&mut buffer) {
                Ok(Some(request)) => {
                    let response = dispatch(client_id, request, &cache, &registry).await;
                    if let Err(e) = write_frame(&writer, &response).await {
                        debug!(client_id, error = %e, "Response write failed");
                        break 'session;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(client_id, error = %e, "Malformed request; closing connection");
                    break 'session;
                }
            }
        }

        tokio::select! {
            result = reader.read_buf(&mut buffer) => match result {
                Ok(0) => {
                    debug!(client_id, "Client closed connection");
                    break 'session;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(client_id, error = %e, "Read failed");
                    break 'session;
                }
            },
            _ = shutdown.changed() => {
                debug!(client_id, "Session stopping on shutdown signal");
                break 'session;
            }
        }
    }

    registry.remove_client(client_id).await;
    notif_handle.abort();
}

/// Routes one decoded request to the engine or the registry.
async fn dispatch(
    client_id: u64,
    request: CacheRequest,
    cache: &Arc<RwLock<CacheStore>>,
    registry: &Arc<SubscriptionRegistry>,
) -> CacheResponse {
    match request.operation.as_str() {
        "Create" => {
            let created = cache.write().await.create(
                request.key_or_blank(),
                request.value_or_null(),
                request.expiration_seconds,
            );
            CacheResponse::outcome(created)
        }
        "Read" => {
            let value = cache.write().await.read(request.key_or_blank());
            CacheResponse::read_result(value)
        }
        "Update" => {
            let updated = cache.write().await.update(
                request.key_or_blank(),
                request.value_or_null(),
                request.expiration_seconds,
            );
            CacheResponse::outcome(updated)
        }
        "Delete" => {
            let deleted = cache.write().await.delete(request.key_or_blank());
            CacheResponse::outcome(deleted)
        }
        "Subscribe" => {
            registry
                .subscribe(client_id, parse_event_types(request.subscribed_event_types))
                .await;
            CacheResponse::outcome(true)
        }
        "Unsubscribe" => {
            registry
                .unsubscribe(client_id, parse_event_types(request.subscribed_event_types))
                .await;
            CacheResponse::outcome(true)
        }
        other => {
            warn!(client_id, operation = other, "Unknown operation");
            CacheResponse::error("Invalid operation")
        }
    }
}

/// Maps wire event-type names to the typed set.
///
/// An omitted or empty list means "everything" (`None`). Unknown names are
/// skipped with a warning; the remaining names still take effect.
fn parse_event_types(names: Option<Vec<String>>) -> Option<Vec<EventType>> {
    let names = names?;
    if names.is_empty() {
        return None;
    }
    Some(
        names
            .iter()
            .filter_map(|name| {
                let parsed = EventType::parse(name);
                if parsed.is_none() {
                    warn!(name = %name, "Unknown event type in subscription; skipping");
                }
                parsed
            })
            .collect(),
    )
}

/// Drains a client's event queue into its socket.
///
/// A failed write means the peer is slow or gone: the client is dropped
/// from the registry and the task ends. Other clients are unaffected.
async fn forward_notifications(
    client_id: u64,
    mut notif_rx: mpsc::UnboundedReceiver<CacheEvent>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    registry: Arc<SubscriptionRegistry>,
) {
    while let Some(event) = notif_rx.recv().await {
        let response = CacheResponse::notification(event);
        if let Err(e) = write_frame(&writer, &response).await {
            warn!(client_id, error = %e, "Notification write failed; dropping client");
            registry.remove_client(client_id).await;
            break;
        }
    }
}

/// Serializes a response and writes it as one newline-terminated frame.
///
/// The writer mutex is held for the whole write, keeping each frame atomic.
async fn write_frame(writer: &Arc<Mutex<OwnedWriteHalf>>, response: &CacheResponse) -> Result<()> {
    let mut frame = serde_json::to_vec(response)?;
    frame.push(b'\n');

    let mut guard = writer.lock().await;
    guard.write_all(&frame).await?;
    Ok(())
}
