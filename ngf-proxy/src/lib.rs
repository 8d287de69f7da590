//! # ngf-proxy
//!
//! D-Bus wire surface for the non-graphic feedback daemon (ngfd).
//!
//! This crate pins down everything the client needs to talk to the daemon
//! without carrying any lifecycle logic of its own: the well-known bus
//! names, the [`FeedbackProxy`] for the daemon interface, the [`Proplist`]
//! payload type and the property filtering the daemon expects.
//!
//! The daemon accepts only boolean, integer and string values inside a
//! play request's property map; [`filter_properties`] drops everything
//! else before transmission.

use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::{OwnedValue, Value};

/// Well-known bus name of the feedback daemon.
pub const SERVICE_NAME: &str = "com.nokia.NonGraphicFeedback1.Backend";

/// Object path of the daemon's feedback interface.
pub const OBJECT_PATH: &str = "/com/nokia/NonGraphicFeedback1";

/// Interface name of the daemon's feedback interface.
pub const INTERFACE_NAME: &str = "com.nokia.NonGraphicFeedback1";

/// Property map attached to a play request (`a{sv}` on the wire).
pub type Proplist = HashMap<String, OwnedValue>;

/// Proxy for the feedback daemon's event interface.
///
/// `Play` returns the server-assigned event id; all subsequent control
/// calls and state signals refer to that id. The four signals report
/// asynchronous state changes for events the daemon has accepted.
#[proxy(
    interface = "com.nokia.NonGraphicFeedback1",
    default_service = "com.nokia.NonGraphicFeedback1.Backend",
    default_path = "/com/nokia/NonGraphicFeedback1"
)]
pub trait Feedback {
    /// Start playback of a named feedback event.
    ///
    /// Returns the server-assigned event id on success.
    fn play(&self, event: &str, properties: Proplist) -> zbus::Result<u32>;

    /// Pause a playing event.
    fn pause(&self, id: u32) -> zbus::Result<bool>;

    /// Resume a paused event.
    fn resume(&self, id: u32) -> zbus::Result<bool>;

    /// Stop an event and release its server-side resources.
    fn stop(&self, id: u32) -> zbus::Result<bool>;

    /// The event entered active playback.
    #[zbus(signal)]
    fn event_playing(&self, id: u32) -> zbus::Result<()>;

    /// The event was paused on the server side.
    #[zbus(signal)]
    fn event_paused(&self, id: u32) -> zbus::Result<()>;

    /// The event finished playing and was released.
    #[zbus(signal)]
    fn event_completed(&self, id: u32) -> zbus::Result<()>;

    /// The event failed and was released.
    #[zbus(signal)]
    fn event_failed(&self, id: u32) -> zbus::Result<()>;
}

/// Restrict a property map to the value types the daemon understands.
///
/// Entries whose value is not a boolean, a 32-bit signed integer or a
/// string are dropped silently, matching the daemon's contract.
pub fn filter_properties(properties: Proplist) -> Proplist {
    properties
        .into_iter()
        .filter(|(key, value)| match &**value {
            Value::Bool(_) | Value::I32(_) | Value::Str(_) => true,
            other => {
                tracing::debug!(
                    key = %key,
                    signature = %other.value_signature(),
                    "dropping property with unsupported value type"
                );
                false
            }
        })
        .collect()
}
