//! Client configuration.

/// Configuration for a [`Client`](crate::Client).
///
/// The defaults target the system-installed feedback daemon on the
/// session bus. Tests and development setups can point the client at a
/// mock service instead.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connect to the system bus instead of the session bus.
    /// Default: false
    pub use_system_bus: bool,

    /// Well-known bus name of the feedback daemon.
    /// Default: [`ngf_proxy::SERVICE_NAME`]
    pub service_name: String,

    /// Object path of the daemon's feedback interface.
    /// Default: [`ngf_proxy::OBJECT_PATH`]
    pub object_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            use_system_bus: false,
            service_name: ngf_proxy::SERVICE_NAME.to_owned(),
            object_path: ngf_proxy::OBJECT_PATH.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_session_daemon() {
        let config = ClientConfig::default();
        assert!(!config.use_system_bus);
        assert_eq!(config.service_name, ngf_proxy::SERVICE_NAME);
        assert_eq!(config.object_path, ngf_proxy::OBJECT_PATH);
    }
}
