//! Live link to the feedback daemon.
//!
//! Owns the bus connection, the daemon proxy, the four signal routing
//! tasks and the presence watch on the daemon's bus name. Dropping the
//! link (via [`ServiceConnection::close`]) stops all routing.

use std::sync::Arc;

use futures::StreamExt;
use ngf_proxy::FeedbackProxy;
use tokio::task::JoinHandle;

use crate::state::{ClientState, RemoteSignal};

pub(crate) struct ServiceConnection {
    proxy: FeedbackProxy<'static>,
    tasks: Vec<JoinHandle<()>>,
}

impl ServiceConnection {
    /// Connect to the bus, build the daemon proxy and start signal
    /// routing and the presence watch.
    pub async fn open(state: Arc<ClientState>) -> zbus::Result<Self> {
        let connection = if state.config.use_system_bus {
            zbus::Connection::system().await?
        } else {
            zbus::Connection::session().await?
        };

        let proxy = FeedbackProxy::builder(&connection)
            .destination(state.config.service_name.clone())?
            .path(state.config.object_path.clone())?
            .build()
            .await?;

        let mut tasks = Vec::new();
        for (member, signal) in [
            ("EventPlaying", RemoteSignal::Playing),
            ("EventPaused", RemoteSignal::Paused),
            ("EventCompleted", RemoteSignal::Completed),
            ("EventFailed", RemoteSignal::Failed),
        ] {
            let stream = proxy.inner().receive_signal(member).await?;
            tasks.push(tokio::spawn(route_signals(
                stream,
                signal,
                Arc::clone(&state),
            )));
        }
        tasks.push(tokio::spawn(watch_service(
            connection.clone(),
            Arc::clone(&state),
        )));

        tracing::debug!(
            service = %state.config.service_name,
            "connected to the feedback service"
        );
        Ok(Self { proxy, tasks })
    }

    pub fn proxy(&self) -> &FeedbackProxy<'static> {
        &self.proxy
    }

    /// Tear down signal routing and the presence watch.
    pub fn close(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Forward one kind of daemon state signal into the state machine.
async fn route_signals(
    mut stream: zbus::proxy::SignalStream<'static>,
    signal: RemoteSignal,
    state: Arc<ClientState>,
) {
    while let Some(message) = stream.next().await {
        match message.body().deserialize::<u32>() {
            Ok(server_id) => state.handle_remote_signal(signal, server_id),
            Err(err) => tracing::warn!(?signal, %err, "malformed state signal"),
        }
    }
}

/// Watch for the daemon leaving the bus.
///
/// Loss of the service sweeps the registry before the not-connected
/// notification goes out, so observers never see stale playing events
/// mixed with a just-lost connection.
async fn watch_service(connection: zbus::Connection, state: Arc<ClientState>) {
    let dbus = match zbus::fdo::DBusProxy::new(&connection).await {
        Ok(proxy) => proxy,
        Err(err) => {
            tracing::warn!(%err, "presence watch unavailable");
            return;
        }
    };
    let mut stream = match dbus
        .receive_name_owner_changed_with_args(&[(0, state.config.service_name.as_str())])
        .await
    {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(%err, "presence watch unavailable");
            return;
        }
    };

    while let Some(change) = stream.next().await {
        let args = match change.args() {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!(%err, "malformed NameOwnerChanged signal");
                continue;
            }
        };
        if args.new_owner().is_none() {
            tracing::info!(
                service = %state.config.service_name,
                "feedback service left the bus"
            );
            state.remove_all_events();
            state.change_connected(false);
        }
    }
}
