//! # ngf-client
//!
//! Client library for the non-graphic feedback daemon (ngfd): play,
//! pause, resume and stop named feedback events (notification sounds
//! and vibration patterns) over D-Bus.
//!
//! Event names such as `"ringtone"` or `"battery_low"` are mapped to
//! sound and haptic configuration by the daemon; this crate only tracks
//! the lifecycle of the requests it issues.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use ngf_client::{Client, ClientEvent};
//!
//! let client = Client::new()?;
//! if !client.connect() {
//!     return Err("feedback daemon unreachable".into());
//! }
//!
//! let id = client.play("ringtone");
//! for event in client.events() {
//!     match event {
//!         ClientEvent::Playing { client_id } if client_id == id => {
//!             println!("ringing");
//!         }
//!         ClientEvent::Completed { client_id } if client_id == id => break,
//!         _ => {}
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The facade is fully synchronous; a background worker thread with its
//! own single-threaded tokio runtime owns all bus I/O:
//!
//! ```text
//! Client (sync facade)
//!     │ commands                      notifications │
//!     ▼                                             ▲
//! worker (current-thread runtime) ──► registry ──► ClientEventIterator
//!     │                                  ▲
//!     ▼ zbus                             │ signals / replies
//! feedback daemon ───────────────────────┘
//! ```
//!
//! Every play request gets a process-unique client id; the daemon's
//! reply binds the server-assigned id used for all later control calls
//! and state signals. If the daemon leaves the bus, every tracked event
//! is terminated and removed before the not-connected notification is
//! delivered.

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use event::{ClientEvent, EventState};
pub use iter::{ClientEventIterator, TimeoutIterator, TryIterator};

// Re-export the wire-level property map for building play requests.
pub use ngf_proxy::Proplist;

mod client;
mod config;
mod connection;
mod error;
mod event;
mod iter;
mod registry;
mod state;
mod worker;
