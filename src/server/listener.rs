//! Listener Module
//!
//! Accepts client connections and spawns one session task per connection,
//! each bound to a fresh unique client identifier.

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::server::{session, AppState};

/// Runs the accept loop until the shutdown flag is raised.
///
/// Accept failures are logged unless the server is already shutting down.
pub async fn serve(listener: TcpListener, state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut next_client_id: u64 = 1;

    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, addr)) => {
                    let client_id = next_client_id;
                    next_client_id += 1;
                    info!(client_id, %addr, "New connection");

                    tokio::spawn(session::handle_connection(
                        client_id,
                        stream,
                        state.cache.clone(),
                        state.registry.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    if !*shutdown.borrow() {
                        error!(error = %e, "Error accepting connection");
                    }
                }
            },
            _ = shutdown.changed() => {
                info!("Listener stopping");
                break;
            }
        }
    }
}
