/*!
 * Driver boundary.
 *
 * The serial transport and the Insteon/X10 frame codec live behind these
 * traits. A driver opens a session on a port; the session reads the all-link
 * database and connects devices; each connected device is reached through a
 * [`DeviceLink`]. Every failure is a [`TransportError`] whose diagnostic text
 * is propagated unchanged.
 */
use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use powerline_core::types::DeviceId;

use crate::database::LinkRecord;
use crate::device::{DeviceInfo, LightCommand};

/// Error reported by a driver, carried verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{diagnostic}")]
pub struct TransportError {
    diagnostic: String,
}

impl TransportError {
    /// Create a transport error from the driver's diagnostic text
    pub fn new<S: Into<String>>(diagnostic: S) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }

    /// The diagnostic text as reported by the driver
    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }
}

/// Result type for driver operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// What a driver hands back for a successful connection
#[derive(Debug)]
pub struct DriverConnection {
    /// What the device reported about itself, including its capability tier
    pub info: DeviceInfo,
    /// Channel for sending commands to the device
    pub link: Box<dyn DeviceLink>,
}

/// Driver for a family of powerline modems
#[async_trait]
pub trait PowerlineDriver: Send + Sync + Debug {
    /// Get the driver name
    fn name(&self) -> &'static str;

    /// Open a session with the modem on `port`
    async fn open(&self, port: &str) -> TransportResult<Box<dyn ModemSession>>;
}

/// An open session with one modem
///
/// Sessions are single-owner: the modem issues one request at a time.
#[async_trait]
pub trait ModemSession: Send + Sync + Debug {
    /// Read the all-link database, in the order the modem stores it
    async fn read_link_database(&self) -> TransportResult<Vec<LinkRecord>>;

    /// Establish a logical connection to a device
    async fn connect(&self, device_id: &DeviceId) -> TransportResult<DriverConnection>;
}

/// Command channel to one connected device
#[async_trait]
pub trait DeviceLink: Send + Sync + Debug {
    /// Send a single command; no acknowledgement of the resulting state is implied
    async fn send(&self, command: LightCommand) -> TransportResult<()>;
}
