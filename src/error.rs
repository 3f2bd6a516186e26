//! Error types for the controller runtime.
//!
//! Protocol-level problems (malformed datagrams, stale frames, sender restarts) are
//! not errors in this sense: the [`FrameAssembler`](crate::assembler::FrameAssembler)
//! counts them and surfaces the latest one through the heartbeat. The errors here
//! cover configuration, socket setup and heartbeat delivery.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: Invalid device files or topologies
//! - **Network Errors**: Socket binding and heartbeat send failures
//! - **Serialization Errors**: Heartbeat records that cannot be encoded
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use ledwire::ControllerError;
//!
//! let error = ControllerError::topology("run count 9 exceeds 8");
//! assert!(!error.is_retryable());
//! ```

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for controller operations.
pub type Result<T, E = ControllerError> = std::result::Result<T, E>;

/// Main error type for controller operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ControllerError {
    #[error("Invalid device configuration: {reason}")]
    Config { reason: String },

    #[error("Invalid run topology: {reason}")]
    Topology { reason: String },

    #[error("Failed to bind UDP port {port}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to send status to {target}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize {context}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

impl ControllerError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ControllerError::Send { .. } => true,
            ControllerError::Bind { .. } => true,
            ControllerError::Io(_) => true,
            ControllerError::Config { .. } => false,
            ControllerError::Topology { .. } => false,
            ControllerError::Serialize { .. } => false,
            ControllerError::Parse { .. } => false,
        }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        ControllerError::Config { reason: reason.into() }
    }

    /// Helper constructor for topology errors.
    pub fn topology(reason: impl Into<String>) -> Self {
        ControllerError::Topology { reason: reason.into() }
    }

    /// Helper constructor for socket bind errors.
    pub fn bind_failed(port: u16, source: io::Error) -> Self {
        ControllerError::Bind { port, source }
    }

    /// Helper constructor for heartbeat send errors.
    pub fn send_failed(target: SocketAddr, source: io::Error) -> Self {
        ControllerError::Send { target, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        ControllerError::Parse { context: context.into(), details: details.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            reason in ".*",
            port in 1u16..u16::MAX,
            details in ".*"
        ) {
            let config_msg = ControllerError::config(reason.clone()).to_string();
            prop_assert!(config_msg.contains(&reason));

            let topology_msg = ControllerError::topology(reason.clone()).to_string();
            prop_assert!(topology_msg.contains(&reason));

            let bind_msg =
                ControllerError::bind_failed(port, io::Error::other("in use")).to_string();
            prop_assert!(bind_msg.contains(&port.to_string()));

            let parse_msg = ControllerError::parse("device file", details.clone()).to_string();
            prop_assert!(parse_msg.contains(&details));
            prop_assert!(parse_msg.contains("device file"));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<ControllerError>();

        let error = ControllerError::config("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        let target: SocketAddr = "10.10.0.1:5567".parse().unwrap();
        assert!(ControllerError::send_failed(target, io::Error::other("unreachable")).is_retryable());
        assert!(ControllerError::bind_failed(5568, io::Error::other("in use")).is_retryable());
        assert!(!ControllerError::config("missing id").is_retryable());
        assert!(!ControllerError::topology("no runs").is_retryable());
    }

    #[test]
    fn io_errors_convert_and_keep_source() {
        let err: ControllerError = io::Error::new(io::ErrorKind::NotFound, "device.yaml").into();
        match &err {
            ControllerError::Io(source) => assert_eq!(source.to_string(), "device.yaml"),
            other => panic!("Expected Io variant, got {other:?}"),
        }

        let target: SocketAddr = "10.10.0.1:5567".parse().unwrap();
        let send = ControllerError::send_failed(target, io::Error::other("no route"));
        let source = std::error::Error::source(&send).expect("send error keeps its source");
        assert_eq!(source.to_string(), "no route");
    }
}
