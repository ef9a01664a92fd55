/*!
 * Device connection manager.
 *
 * Connecting turns a [`DeviceId`] into a capability-typed [`Device`]. Each
 * call makes exactly one attempt; retry policy belongs to the caller. Bulk
 * connection walks the link database in order and reports one outcome per
 * record, carrying on past failures.
 */
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn, Instrument};

use powerline_core::logging::operation_span;
use powerline_core::types::DeviceId;

use crate::device::Device;
use crate::error::{PowerlineError, Result};
use crate::modem::Modem;

/// Outcome of connecting one link record
pub type DeviceOutcome = (DeviceId, Result<Device>);

impl Modem {
    /// Connect to a single device
    ///
    /// A blank ID is rejected before the driver is called. A driver failure
    /// becomes [`PowerlineError::Connection`] with the driver's diagnostic.
    pub async fn connect_device(&self, device_id: &DeviceId) -> Result<Device> {
        if device_id.is_blank() {
            return Err(PowerlineError::invalid_argument("device id must not be empty"));
        }

        let span = operation_span("connect_device", self.port());
        async {
            debug!("Connecting to device {}", device_id);
            match self.session().connect(device_id).await {
                Ok(mut connection) => {
                    // The handle is keyed by the ID the caller asked for
                    connection.info.id = device_id.clone();
                    let device = Device::from_connection(connection, self.error_slot());
                    debug!("Connected to device {} as {}", device_id, device.capability());
                    Ok(device)
                }
                Err(source) => {
                    warn!("Failed to connect to device {}: {}", device_id, source);
                    self.record_error(&source);
                    Err(PowerlineError::Connection {
                        device_id: device_id.clone(),
                        source,
                    })
                }
            }
        }
        .instrument(span)
        .instrument(self.span().clone())
        .await
    }

    /// Connect to every device in the link database, in database order
    ///
    /// The database is read when this is called; failing to read it is a
    /// [`PowerlineError::ModemCommunication`]. The returned stream is lazy
    /// and sequential: each record is connected when polled, and a failed
    /// record yields its error without ending the stream. Calling again
    /// starts a fresh scan from a fresh database read.
    pub async fn connect_all(&self) -> Result<impl Stream<Item = DeviceOutcome> + '_> {
        let database = self.link_database().await?;
        info!("Connecting {} devices from {}", database.len(), self.port());

        Ok(stream::iter(database).then(move |record| async move {
            let result = self.connect_device(&record.device_id).await;
            (record.device_id, result)
        }))
    }
}

/// Tally of a bulk connection scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Records that produced a device
    pub connected: usize,
    /// Records that produced an error
    pub failed: usize,
}

impl ScanSummary {
    /// Count one outcome
    pub fn record<T>(&mut self, outcome: &Result<T>) {
        match outcome {
            Ok(_) => self.connected += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// Number of outcomes counted
    pub fn total(&self) -> usize {
        self.connected + self.failed
    }
}
