//! Event records and client-facing notifications.

use ngf_proxy::Proplist;

/// Lifecycle state of a tracked feedback event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    /// Created locally; the daemon has not yet reported playback.
    New,
    /// The daemon reported the event as playing.
    Playing,
    /// The daemon reported the event as paused.
    Paused,
    /// Terminal state, set on a record as it leaves the registry. It is
    /// never observable through [`crate::Client::event_state`].
    Stopped,
}

/// A single tracked feedback event.
///
/// One record exists per outstanding play request. The client id is
/// assigned locally, is never `0` and is never reused for the lifetime
/// of the process; the server id stays `0` until the daemon's `Play`
/// reply binds it.
#[derive(Debug)]
pub(crate) struct Event {
    pub client_id: u32,
    pub server_id: u32,
    pub name: String,
    pub properties: Proplist,
    pub state: EventState,
}

/// Notifications delivered through [`crate::ClientEventIterator`].
///
/// Delivery order matches processing order: a removal always precedes
/// the notification that reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// The connection to the daemon changed state. Emitted exactly once
    /// per actual transition.
    ConnectionStatus(bool),
    /// The daemon started (or resumed) playing the event.
    Playing { client_id: u32 },
    /// The daemon paused the event.
    Paused { client_id: u32 },
    /// The event failed; it is no longer tracked.
    Failed { client_id: u32 },
    /// The event finished playing; it is no longer tracked.
    Completed { client_id: u32 },
    /// The event was stopped locally, either by an explicit stop call or
    /// by a connection-loss sweep; it is no longer tracked.
    Stopped { client_id: u32 },
}
