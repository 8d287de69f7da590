//! Shared client state and the per-event state machine transitions.
//!
//! Everything that reacts to daemon traffic lives here: play-reply
//! correlation, signal routing and the connection-loss sweep. The sync
//! facade and the worker's tasks share one [`ClientState`] behind an
//! `Arc`; the registry mutex is the only lock in the crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use parking_lot::Mutex;

use crate::config::ClientConfig;
use crate::event::{ClientEvent, EventState};
use crate::registry::{Bind, EventRegistry};

/// Daemon state signals, decoupled from their D-Bus member names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RemoteSignal {
    Playing,
    Paused,
    Completed,
    Failed,
}

/// State shared between the sync facade and the worker's tasks.
pub(crate) struct ClientState {
    pub registry: Mutex<EventRegistry>,
    pub config: ClientConfig,
    connected: AtomicBool,
    event_tx: mpsc::Sender<ClientEvent>,
}

impl ClientState {
    pub fn new(config: ClientConfig, event_tx: mpsc::Sender<ClientEvent>) -> Self {
        Self {
            registry: Mutex::new(EventRegistry::new()),
            config,
            connected: AtomicBool::new(false),
            event_tx,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Flip the connected flag, notifying only on an actual transition.
    pub fn change_connected(&self, connected: bool) {
        if self.connected.swap(connected, Ordering::SeqCst) != connected {
            tracing::info!(connected, "connection status changed");
            self.emit(ClientEvent::ConnectionStatus(connected));
        }
    }

    /// Deliver a notification to subscribers. Nobody listening is fine;
    /// notifications are best-effort.
    pub fn emit(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Apply the daemon's reply to a pending `Play` call.
    ///
    /// Correlation is by the client id captured when the call was
    /// issued, never by name. A reply for a record that a
    /// connection-loss sweep already removed is dropped silently. A
    /// successful reply only binds the server id; the record stays `New`
    /// until the daemon's explicit playing signal arrives.
    pub fn handle_play_reply(&self, client_id: u32, reply: zbus::Result<u32>) {
        match reply {
            Ok(server_id) if server_id != 0 => {
                // Bind before matching so the registry guard is released;
                // the duplicate path takes the lock again.
                let bind = self.registry.lock().bind_server_id(client_id, server_id);
                match bind {
                    Bind::Bound => {
                        tracing::debug!(client_id, server_id, "play request acknowledged");
                    }
                    Bind::Gone => {
                        tracing::debug!(client_id, server_id, "reply for a removed event, dropping");
                    }
                    Bind::Duplicate => {
                        tracing::warn!(client_id, server_id, "daemon reused a live server id");
                        self.fail_event(client_id);
                    }
                }
            }
            Ok(_) => {
                tracing::warn!(client_id, "daemon rejected play with a zero id");
                self.fail_event(client_id);
            }
            Err(err) => {
                tracing::debug!(client_id, %err, "play request failed");
                self.fail_event(client_id);
            }
        }
    }

    /// Remove a record and report it failed. A no-op when the record is
    /// already gone.
    pub fn fail_event(&self, client_id: u32) {
        if self.registry.lock().remove(client_id).is_some() {
            self.emit(ClientEvent::Failed { client_id });
        }
    }

    /// Route a daemon state signal to the matching record.
    ///
    /// Signals for unknown server ids are no-ops; that is the expected
    /// outcome of a race between a local stop and an in-flight signal.
    /// Duplicate signals re-emit the notification but change nothing
    /// else.
    pub fn handle_remote_signal(&self, signal: RemoteSignal, server_id: u32) {
        if server_id == 0 {
            tracing::warn!(?signal, "state signal with a zero server id");
            return;
        }
        let mut registry = self.registry.lock();
        match signal {
            RemoteSignal::Playing | RemoteSignal::Paused => {
                let Some(event) = registry.get_by_server_id(server_id) else {
                    tracing::debug!(?signal, server_id, "signal for an untracked event");
                    return;
                };
                let client_id = event.client_id;
                let notification = if signal == RemoteSignal::Playing {
                    event.state = EventState::Playing;
                    ClientEvent::Playing { client_id }
                } else {
                    event.state = EventState::Paused;
                    ClientEvent::Paused { client_id }
                };
                drop(registry);
                self.emit(notification);
            }
            RemoteSignal::Completed | RemoteSignal::Failed => {
                let Some(event) = registry.remove_by_server_id(server_id) else {
                    tracing::debug!(?signal, server_id, "signal for an untracked event");
                    return;
                };
                let client_id = event.client_id;
                drop(registry);
                let notification = if signal == RemoteSignal::Completed {
                    ClientEvent::Completed { client_id }
                } else {
                    ClientEvent::Failed { client_id }
                };
                self.emit(notification);
            }
        }
    }

    /// Force-terminate every tracked event; used on connection loss.
    ///
    /// Bound events are reported as stopped, events whose play was never
    /// acknowledged as failed. Records are removed before any
    /// notification goes out, so observers never see a stale event after
    /// a lost connection.
    pub fn remove_all_events(&self) {
        let drained = self.registry.lock().drain();
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "removing all tracked events");
        }
        for mut event in drained {
            let client_id = event.client_id;
            if event.server_id != 0 {
                event.state = EventState::Stopped;
            }
            let notification = match event.state {
                EventState::Stopped => ClientEvent::Stopped { client_id },
                _ => ClientEvent::Failed { client_id },
            };
            self.emit(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ngf_proxy::Proplist;

    fn test_state() -> (ClientState, mpsc::Receiver<ClientEvent>) {
        let (event_tx, event_rx) = mpsc::channel();
        (ClientState::new(ClientConfig::default(), event_tx), event_rx)
    }

    fn drain(rx: &mpsc::Receiver<ClientEvent>) -> Vec<ClientEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn successful_reply_binds_server_id_and_stays_new() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());

        state.handle_play_reply(client_id, Ok(42));

        let registry = state.registry.lock();
        let event = registry.get(client_id).unwrap();
        assert_eq!(event.server_id, 42);
        assert_eq!(event.state, EventState::New);
        drop(registry);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn failed_reply_removes_record_and_emits_failed() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());

        state.handle_play_reply(client_id, Err(zbus::Error::InvalidReply));

        assert!(state.registry.lock().is_empty());
        assert_eq!(drain(&rx), vec![ClientEvent::Failed { client_id }]);
    }

    #[test]
    fn zero_server_id_reply_counts_as_failure() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());

        state.handle_play_reply(client_id, Ok(0));

        assert!(state.registry.lock().is_empty());
        assert_eq!(drain(&rx), vec![ClientEvent::Failed { client_id }]);
    }

    #[test]
    fn reply_for_a_swept_record_is_dropped() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());
        state.remove_all_events();
        let _ = drain(&rx);

        state.handle_play_reply(client_id, Ok(42));

        assert!(state.registry.lock().is_empty());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn duplicate_server_id_fails_the_new_record() {
        let (state, rx) = test_state();
        let first = state.registry.lock().create("alert", Proplist::new());
        let second = state.registry.lock().create("alert", Proplist::new());

        state.handle_play_reply(first, Ok(42));
        state.handle_play_reply(second, Ok(42));

        let registry = state.registry.lock();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(first).unwrap().server_id, 42);
        drop(registry);
        assert_eq!(drain(&rx), vec![ClientEvent::Failed { client_id: second }]);
    }

    #[test]
    fn playing_signal_transitions_and_notifies() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());
        state.handle_play_reply(client_id, Ok(42));

        state.handle_remote_signal(RemoteSignal::Playing, 42);

        assert_eq!(
            state.registry.lock().get(client_id).unwrap().state,
            EventState::Playing
        );
        assert_eq!(drain(&rx), vec![ClientEvent::Playing { client_id }]);
    }

    #[test]
    fn pause_and_resume_signals_toggle_state() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());
        state.handle_play_reply(client_id, Ok(42));

        state.handle_remote_signal(RemoteSignal::Playing, 42);
        state.handle_remote_signal(RemoteSignal::Paused, 42);
        assert_eq!(
            state.registry.lock().get(client_id).unwrap().state,
            EventState::Paused
        );

        state.handle_remote_signal(RemoteSignal::Playing, 42);
        assert_eq!(
            state.registry.lock().get(client_id).unwrap().state,
            EventState::Playing
        );
        assert_eq!(
            drain(&rx),
            vec![
                ClientEvent::Playing { client_id },
                ClientEvent::Paused { client_id },
                ClientEvent::Playing { client_id },
            ]
        );
    }

    #[test]
    fn completed_signal_removes_record_exactly_once() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());
        state.handle_play_reply(client_id, Ok(42));

        state.handle_remote_signal(RemoteSignal::Completed, 42);
        assert!(state.registry.lock().is_empty());
        assert_eq!(drain(&rx), vec![ClientEvent::Completed { client_id }]);

        // A duplicate completion is a no-op.
        state.handle_remote_signal(RemoteSignal::Completed, 42);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn failed_signal_removes_record_and_notifies() {
        let (state, rx) = test_state();
        let client_id = state.registry.lock().create("ringtone", Proplist::new());
        state.handle_play_reply(client_id, Ok(42));

        state.handle_remote_signal(RemoteSignal::Failed, 42);
        assert!(state.registry.lock().is_empty());
        assert_eq!(drain(&rx), vec![ClientEvent::Failed { client_id }]);
    }

    #[test]
    fn signals_for_unknown_server_ids_are_ignored() {
        let (state, rx) = test_state();
        state.handle_remote_signal(RemoteSignal::Playing, 7);
        state.handle_remote_signal(RemoteSignal::Completed, 7);
        state.handle_remote_signal(RemoteSignal::Failed, 0);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn sweep_distinguishes_bound_and_unbound_events() {
        let (state, rx) = test_state();
        let bound = state.registry.lock().create("ringtone", Proplist::new());
        let pending_a = state.registry.lock().create("chat", Proplist::new());
        let pending_b = state.registry.lock().create("battery_low", Proplist::new());
        state.handle_play_reply(bound, Ok(42));

        state.remove_all_events();

        assert!(state.registry.lock().is_empty());
        assert_eq!(
            drain(&rx),
            vec![
                ClientEvent::Stopped { client_id: bound },
                ClientEvent::Failed { client_id: pending_a },
                ClientEvent::Failed { client_id: pending_b },
            ]
        );
    }

    #[test]
    fn connection_status_is_emitted_once_per_transition() {
        let (state, rx) = test_state();
        state.change_connected(true);
        state.change_connected(true);
        state.change_connected(false);
        state.change_connected(false);
        assert_eq!(
            drain(&rx),
            vec![
                ClientEvent::ConnectionStatus(true),
                ClientEvent::ConnectionStatus(false),
            ]
        );
    }
}
