use std::fmt;

use sliptun_bridge::BridgeError;
use sliptun_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::UnsupportedBaud(_) => USAGE,
        TransportError::Poll(_) | TransportError::Io(_) => INTERNAL,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn bridge_error(context: &str, err: BridgeError) -> CliError {
    match err {
        BridgeError::Transport(err) => transport_error(context, err),
        BridgeError::PeerDisconnected | BridgeError::SerialClosed => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_baud_maps_to_usage() {
        let err = transport_error("baud rate", TransportError::UnsupportedBaud(300));
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("300"));
    }

    #[test]
    fn setup_failures_map_to_transport_code() {
        let err = transport_error(
            "serial setup",
            TransportError::NoDevice,
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("serial setup: "));
    }

    #[test]
    fn peer_loss_maps_to_failure() {
        let err = bridge_error("bridge", BridgeError::PeerDisconnected);
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn serial_loss_maps_to_failure() {
        let err = bridge_error("bridge", BridgeError::SerialClosed);
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn nested_transport_error_keeps_its_mapping() {
        let err = bridge_error(
            "bridge",
            BridgeError::Transport(TransportError::UnsupportedBaud(42)),
        );
        assert_eq!(err.code, USAGE);
    }
}
