/*!
 * Error types for the device layer.
 *
 * Argument and capability violations are raised before any I/O. Errors that
 * originate in the driver keep the driver's [`TransportError`] as their source
 * so the diagnostic text reaches the caller untouched.
 */
use thiserror::Error;

use powerline_core::error::Error as CoreError;
use powerline_core::types::{Capability, DeviceId};

use crate::device::LightCommand;
use crate::driver::TransportError;

/// Error type for modem, connection and command operations
#[derive(Error, Debug)]
pub enum PowerlineError {
    /// The modem could not be opened or its link database could not be read
    #[error("Modem communication error on {port}: {source}")]
    ModemCommunication {
        /// Transport identifier of the modem
        port: String,
        /// Error reported by the driver
        #[source]
        source: TransportError,
    },

    /// A specific device could not be reached
    #[error("Connection error for device {device_id}: {source}")]
    Connection {
        /// The device that was attempted
        device_id: DeviceId,
        /// Error reported by the driver
        #[source]
        source: TransportError,
    },

    /// The operation needs a higher capability tier than the device has
    #[error("Unsupported capability for device {device_id}: {message} (device is {actual})")]
    UnsupportedCapability {
        /// The device the operation targeted
        device_id: DeviceId,
        /// Tier the operation needs
        required: Capability,
        /// Tier the device reported at connection time
        actual: Capability,
        /// Human readable reason
        message: String,
    },

    /// A valid command failed in transit or on the device
    #[error("Command dispatch error for device {device_id} ({command}): {source}")]
    CommandDispatch {
        /// The device the command was sent to
        device_id: DeviceId,
        /// The command that failed
        command: LightCommand,
        /// Error reported by the driver
        #[source]
        source: TransportError,
    },

    /// Caller contract violation (empty device ID, out of range ramp level)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Core error (configuration, logging)
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, PowerlineError>;

impl PowerlineError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: AsRef<str>>(msg: S) -> Self {
        PowerlineError::InvalidArgument(msg.as_ref().to_string())
    }

    /// The driver's diagnostic, for errors that came from the driver
    pub fn diagnostic(&self) -> Option<&str> {
        self.transport_error().map(TransportError::diagnostic)
    }

    /// The driver error, for errors that came from the driver
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            PowerlineError::ModemCommunication { source, .. }
            | PowerlineError::Connection { source, .. }
            | PowerlineError::CommandDispatch { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the modem itself could not be queried
    pub fn is_modem_communication(&self) -> bool {
        matches!(self, PowerlineError::ModemCommunication { .. })
    }

    /// Whether a device could not be reached
    pub fn is_connection(&self) -> bool {
        matches!(self, PowerlineError::Connection { .. })
    }

    /// Whether the device lacked the capability for the operation
    pub fn is_unsupported_capability(&self) -> bool {
        matches!(self, PowerlineError::UnsupportedCapability { .. })
    }

    /// Whether a command failed after it was issued
    pub fn is_command_dispatch(&self) -> bool {
        matches!(self, PowerlineError::CommandDispatch { .. })
    }

    /// Whether the caller passed an invalid argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PowerlineError::InvalidArgument(_))
    }

    /// Whether the error was raised before any I/O took place
    pub fn is_local(&self) -> bool {
        self.is_invalid_argument() || self.is_unsupported_capability()
    }
}
