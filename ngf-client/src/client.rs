//! Synchronous client facade.

use std::sync::mpsc;
use std::sync::{Arc, OnceLock, Weak};
use std::thread::JoinHandle;

use ngf_proxy::Proplist;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::event::{ClientEvent, EventState};
use crate::iter::ClientEventIterator;
use crate::state::ClientState;
use crate::worker::{spawn_worker, Command};

/// Lookup key for control calls.
enum Target<'a> {
    Id(u32),
    Name(&'a str),
}

/// Remote state change requested for a tracked event.
#[derive(Clone, Copy, PartialEq)]
enum Control {
    Pause,
    Resume,
    Stop,
}

/// Client for the non-graphic feedback daemon.
///
/// Fully synchronous API: all bus I/O happens on a background worker,
/// and the lifecycle methods return immediately after scheduling (or
/// rejecting) a remote request. Playback state arrives asynchronously
/// through [`Client::events`].
///
/// # Example
///
/// ```rust,ignore
/// use ngf_client::Client;
///
/// let client = Client::new()?;
/// if client.connect() {
///     let id = client.play("ringtone");
///     for event in client.events() {
///         println!("event {id}: {event:?}");
///     }
/// }
/// ```
pub struct Client {
    /// Registry, connection flag and notification sender, shared with
    /// the worker's tasks.
    state: Arc<ClientState>,

    /// Command channel into the background worker.
    command_tx: UnboundedSender<Command>,

    /// Receiving side of the notification channel, handed out to
    /// [`ClientEventIterator`]s.
    event_rx: Arc<Mutex<mpsc::Receiver<ClientEvent>>>,

    /// Background worker handle (kept alive).
    _worker: JoinHandle<()>,
}

static SHARED: OnceLock<Mutex<Weak<Client>>> = OnceLock::new();

impl Client {
    /// Create a client with the default configuration.
    ///
    /// Spawns the background worker; the bus is not touched until
    /// [`Client::connect`] is called.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with a custom configuration.
    ///
    /// Fails when the configured object path is not a valid D-Bus path.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        zbus::zvariant::ObjectPath::try_from(config.object_path.as_str())
            .map_err(zbus::Error::from)?;

        let (event_tx, event_rx) = mpsc::channel();
        let (command_tx, command_rx) = tokio::sync::mpsc::unbounded_channel();
        let state = Arc::new(ClientState::new(config, event_tx));
        let worker = spawn_worker(Arc::clone(&state), command_rx);

        Ok(Self {
            state,
            command_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            _worker: worker,
        })
    }

    /// Process-wide shared instance.
    ///
    /// Constructed on first acquisition and kept alive by the returned
    /// handles; once every holder has released it, the next call builds
    /// a fresh client.
    pub fn shared() -> Result<Arc<Self>> {
        let slot = SHARED.get_or_init(|| Mutex::new(Weak::new()));
        let mut weak = slot.lock();
        if let Some(client) = weak.upgrade() {
            return Ok(client);
        }
        let client = Arc::new(Self::new()?);
        *weak = Arc::downgrade(&client);
        Ok(client)
    }

    /// Establish the connection to the feedback daemon and start
    /// watching its presence on the bus.
    ///
    /// Idempotent: connecting while connected is a no-op returning
    /// `true`. Returns `false` when the bus is unreachable.
    pub fn connect(&self) -> bool {
        if self.is_connected() {
            return true;
        }
        let (reply_tx, reply_rx) = mpsc::channel();
        if self
            .command_tx
            .send(Command::Connect { reply: reply_tx })
            .is_err()
        {
            return false;
        }
        reply_rx.recv().unwrap_or(false)
    }

    /// Whether the daemon connection is currently up.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Drop the connection and the presence watch.
    ///
    /// Tracked events are left alone; only the daemon leaving the bus
    /// sweeps them.
    pub fn disconnect(&self) {
        self.state.change_connected(false);
        let _ = self.command_tx.send(Command::Disconnect);
    }

    /// Request playback of a named feedback event.
    ///
    /// Returns the client event id, or `0` when not connected. The id
    /// is valid immediately; playback confirmation arrives later as a
    /// [`ClientEvent::Playing`] notification.
    pub fn play(&self, name: &str) -> u32 {
        self.play_with_properties(name, Proplist::new())
    }

    /// Request playback with a property map.
    ///
    /// Properties with values other than booleans, 32-bit integers or
    /// strings are dropped before transmission.
    pub fn play_with_properties(&self, name: &str, properties: Proplist) -> u32 {
        if !self.is_connected() {
            tracing::debug!(name, "play request while disconnected");
            return 0;
        }
        let properties = ngf_proxy::filter_properties(properties);
        let client_id = self.state.registry.lock().create(name, properties);
        if self
            .command_tx
            .send(Command::Play { client_id })
            .is_err()
        {
            // Worker is gone; drop the record so no orphan lingers.
            self.state.registry.lock().remove(client_id);
            return 0;
        }
        tracing::debug!(name, client_id, "play scheduled");
        client_id
    }

    /// Pause a playing event by client id.
    ///
    /// Returns `false` when the event is unknown or its play request has
    /// not been acknowledged yet; control calls are never queued.
    pub fn pause(&self, client_event_id: u32) -> bool {
        self.control(Target::Id(client_event_id), Control::Pause)
    }

    /// Pause the most recently created event with the given name.
    pub fn pause_by_name(&self, name: &str) -> bool {
        self.control(Target::Name(name), Control::Pause)
    }

    /// Resume a paused event by client id.
    pub fn resume(&self, client_event_id: u32) -> bool {
        self.control(Target::Id(client_event_id), Control::Resume)
    }

    /// Resume the most recently created event with the given name.
    pub fn resume_by_name(&self, name: &str) -> bool {
        self.control(Target::Name(name), Control::Resume)
    }

    /// Stop an event by client id.
    ///
    /// The record is removed immediately after the remote call is
    /// scheduled; a stray state signal arriving for it afterwards is
    /// ignored.
    pub fn stop(&self, client_event_id: u32) -> bool {
        self.control(Target::Id(client_event_id), Control::Stop)
    }

    /// Stop the most recently created event with the given name.
    pub fn stop_by_name(&self, name: &str) -> bool {
        self.control(Target::Name(name), Control::Stop)
    }

    /// Subscribe to client notifications.
    ///
    /// Iterators are cheap to clone and share one underlying channel;
    /// delivery order matches processing order.
    pub fn events(&self) -> ClientEventIterator {
        ClientEventIterator::new(Arc::clone(&self.event_rx))
    }

    /// Current lifecycle state of a tracked event, if any.
    pub fn event_state(&self, client_event_id: u32) -> Option<EventState> {
        self.state
            .registry
            .lock()
            .get(client_event_id)
            .map(|event| event.state)
    }

    /// Number of events currently tracked.
    pub fn tracked_events(&self) -> usize {
        self.state.registry.lock().len()
    }

    fn control(&self, target: Target<'_>, control: Control) -> bool {
        let mut registry = self.state.registry.lock();
        let event = match target {
            Target::Id(client_id) => registry.get(client_id),
            Target::Name(name) => registry.latest_by_name(name),
        };
        let Some(event) = event else {
            return false;
        };
        // A record still waiting for its play reply cannot be
        // controlled; the server id is the only valid handle.
        if event.server_id == 0 {
            return false;
        }
        let client_id = event.client_id;
        let server_id = event.server_id;

        let command = match control {
            Control::Pause => Command::Pause { server_id },
            Control::Resume => Command::Resume { server_id },
            Control::Stop => Command::Stop { server_id },
        };
        if self.command_tx.send(command).is_err() {
            return false;
        }

        if control == Control::Stop {
            if let Some(mut event) = registry.remove(client_id) {
                event.state = EventState::Stopped;
                tracing::debug!(client_id, state = ?event.state, "event stopped locally");
            }
            drop(registry);
            self.state.emit(ClientEvent::Stopped { client_id });
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn state_for_tests(&self) -> &Arc<ClientState> {
        &self.state
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let _ = self.command_tx.send(Command::Shutdown);
    }
}
