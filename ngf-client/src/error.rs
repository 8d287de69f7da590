use thiserror::Error;

/// Errors surfaced by the client's plumbing.
///
/// The event lifecycle API itself reports failure through sentinel
/// returns (a `0` client id, `false`) and asynchronous notifications;
/// this type only covers construction and bus-level wiring.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Underlying D-Bus failure.
    #[error("bus error: {0}")]
    Bus(#[from] zbus::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_errors_keep_their_context() {
        let err = ClientError::from(zbus::Error::InvalidReply);
        assert!(err.to_string().starts_with("bus error:"));
    }
}
