//! Background worker owning all bus I/O.
//!
//! The worker runs a current-thread tokio runtime on a dedicated thread
//! and mirrors the facade's commands onto asynchronous bus calls, so the
//! public API never blocks on the daemon. Remote calls are spawned as
//! tasks; a slow daemon cannot stall command processing, and each `Play`
//! task carries the client id it was issued for, which is what
//! correlates the eventual reply with its record.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::connection::ServiceConnection;
use crate::state::ClientState;

/// Commands sent from the sync facade to the background worker.
#[derive(Debug)]
pub(crate) enum Command {
    /// Establish the bus connection; replies with the outcome.
    Connect { reply: mpsc::Sender<bool> },
    /// Drop the connection and the presence watch.
    Disconnect,
    /// Issue the asynchronous `Play` call for a freshly created record.
    Play { client_id: u32 },
    /// Pause the event with the given server id.
    Pause { server_id: u32 },
    /// Resume the event with the given server id.
    Resume { server_id: u32 },
    /// Stop the event with the given server id.
    Stop { server_id: u32 },
    /// Shut the worker down.
    Shutdown,
}

/// Spawn the worker thread with its own single-threaded runtime.
pub(crate) fn spawn_worker(
    state: Arc<ClientState>,
    command_rx: UnboundedReceiver<Command>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => {
                tracing::error!(%err, "failed to build the worker runtime");
                return;
            }
        };
        rt.block_on(run(state, command_rx));
    })
}

async fn run(state: Arc<ClientState>, mut command_rx: UnboundedReceiver<Command>) {
    let mut link: Option<ServiceConnection> = None;
    tracing::info!("feedback worker started");

    while let Some(command) = command_rx.recv().await {
        match command {
            Command::Connect { reply } => {
                let ok = if link.is_some() {
                    true
                } else {
                    match ServiceConnection::open(Arc::clone(&state)).await {
                        Ok(connection) => {
                            link = Some(connection);
                            true
                        }
                        Err(err) => {
                            tracing::warn!(%err, "connection to the bus failed");
                            false
                        }
                    }
                };
                if ok {
                    state.change_connected(true);
                }
                let _ = reply.send(ok);
            }
            Command::Disconnect => {
                if let Some(connection) = link.take() {
                    connection.close();
                }
                state.change_connected(false);
            }
            Command::Play { client_id } => {
                let Some(connection) = link.as_ref() else {
                    // The connected flag can flip between the facade's
                    // check and command processing. A play that cannot be
                    // issued must not leave its record behind.
                    tracing::warn!(client_id, "play scheduled without a connection");
                    state.fail_event(client_id);
                    continue;
                };
                // The play payload lives on the record; a record gone by
                // now was swept by a connection loss, and its reply
                // context must not be created at all.
                let request = state.registry.lock().take_play_request(client_id);
                let Some((name, properties)) = request else {
                    tracing::debug!(client_id, "event removed before play was issued");
                    continue;
                };
                let proxy = connection.proxy().clone();
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let reply = proxy.play(&name, properties).await;
                    state.handle_play_reply(client_id, reply);
                });
            }
            Command::Pause { server_id } => {
                if let Some(connection) = link.as_ref() {
                    let proxy = connection.proxy().clone();
                    tokio::spawn(async move {
                        if let Err(err) = proxy.pause(server_id).await {
                            tracing::warn!(server_id, %err, "pause request failed");
                        }
                    });
                }
            }
            Command::Resume { server_id } => {
                if let Some(connection) = link.as_ref() {
                    let proxy = connection.proxy().clone();
                    tokio::spawn(async move {
                        if let Err(err) = proxy.resume(server_id).await {
                            tracing::warn!(server_id, %err, "resume request failed");
                        }
                    });
                }
            }
            Command::Stop { server_id } => {
                // Fire and forget: the record is already removed locally
                // and a stray signal for this id will be ignored.
                if let Some(connection) = link.as_ref() {
                    let proxy = connection.proxy().clone();
                    tokio::spawn(async move {
                        if let Err(err) = proxy.stop(server_id).await {
                            tracing::warn!(server_id, %err, "stop request failed");
                        }
                    });
                }
            }
            Command::Shutdown => {
                tracing::info!("feedback worker shutting down");
                break;
            }
        }
    }

    if let Some(connection) = link.take() {
        connection.close();
    }
}
