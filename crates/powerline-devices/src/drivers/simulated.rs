/*!
 * In-memory driver.
 *
 * Stands in for a serial modem: it serves a configured all-link database,
 * answers connections with the configured capability tier and records every
 * connection attempt and command it receives. Failures can be injected per
 * database read, per connection and per device send.
 */
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use powerline_core::config::{SimulatedDeviceConfig, SimulationConfig};
use powerline_core::types::{Capability, DeviceId};

use crate::database::LinkRecord;
use crate::device::{DeviceInfo, LightCommand};
use crate::driver::{
    DeviceLink, DriverConnection, ModemSession, PowerlineDriver, TransportError, TransportResult,
};

/// A device served by the simulated modem
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    info: DeviceInfo,
    group: Option<u8>,
    connect_error: Option<String>,
    send_error: Option<String>,
}

impl SimulatedDevice {
    /// A reachable device with the given tier
    pub fn new<I: Into<DeviceId>>(id: I, capability: Capability) -> Self {
        Self {
            info: DeviceInfo::new(id.into(), capability),
            group: None,
            connect_error: None,
            send_error: None,
        }
    }

    /// Report Insteon category bytes; the tier follows the category
    pub fn with_category(mut self, category: u8, subcategory: Option<u8>) -> Self {
        self.info = self.info.with_category(category, subcategory);
        self.info.capability = Capability::from_category(category);
        self
    }

    /// Report a description on connect
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.info = self.info.with_description(description);
        self
    }

    /// List the record under an all-link group
    pub fn with_group(mut self, group: u8) -> Self {
        self.group = Some(group);
        self
    }

    /// Fail every connection attempt with `diagnostic`
    pub fn failing_connect<S: Into<String>>(mut self, diagnostic: S) -> Self {
        self.connect_error = Some(diagnostic.into());
        self
    }

    /// Fail every command with `diagnostic`
    pub fn failing_send<S: Into<String>>(mut self, diagnostic: S) -> Self {
        self.send_error = Some(diagnostic.into());
        self
    }

    fn from_config(config: &SimulatedDeviceConfig) -> Self {
        let mut info = DeviceInfo::new(
            DeviceId::from(config.id.as_str()),
            config.reported_capability(),
        );
        info.category = config.category_byte();
        info.subcategory = config.subcategory_byte();
        info.description = config.description.clone();
        Self {
            info,
            group: None,
            connect_error: config.connect_error.clone(),
            send_error: config.send_error.clone(),
        }
    }

    fn record(&self) -> LinkRecord {
        let mut record = LinkRecord::new(self.info.id.clone());
        record.group = self.group;
        record
    }
}

#[derive(Debug, Default)]
struct SimulatedState {
    open_error: Option<String>,
    database_error: Option<String>,
    devices: Vec<SimulatedDevice>,
    opened_ports: Mutex<Vec<String>>,
    database_reads: Mutex<usize>,
    connect_attempts: Mutex<Vec<DeviceId>>,
    sent_commands: Mutex<Vec<(DeviceId, LightCommand)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Driver backed by memory instead of a serial port
///
/// Clones share the same devices and the same recorded activity.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDriver {
    state: Arc<SimulatedState>,
}

impl SimulatedDriver {
    /// Start building a simulated driver
    pub fn builder() -> SimulatedDriverBuilder {
        SimulatedDriverBuilder::default()
    }

    /// Build from the `[simulation]` config section
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut builder = Self::builder();
        if let Some(diagnostic) = &config.database_error {
            builder = builder.database_error(diagnostic.clone());
        }
        for device in &config.devices {
            builder = builder.device(SimulatedDevice::from_config(device));
        }
        builder.build()
    }

    /// Ports that were opened, in order
    pub fn opened_ports(&self) -> Vec<String> {
        lock(&self.state.opened_ports).clone()
    }

    /// Number of link database reads served or refused
    pub fn database_reads(&self) -> usize {
        *lock(&self.state.database_reads)
    }

    /// Every connection attempt, in order, successful or not
    pub fn connect_attempts(&self) -> Vec<DeviceId> {
        lock(&self.state.connect_attempts).clone()
    }

    /// Every command handed to a device link, in order, successful or not
    pub fn sent_commands(&self) -> Vec<(DeviceId, LightCommand)> {
        lock(&self.state.sent_commands).clone()
    }
}

/// Builder for [`SimulatedDriver`]
#[derive(Debug, Default)]
pub struct SimulatedDriverBuilder {
    open_error: Option<String>,
    database_error: Option<String>,
    devices: Vec<SimulatedDevice>,
}

impl SimulatedDriverBuilder {
    /// Add a device; database order is insertion order
    pub fn device(mut self, device: SimulatedDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Fail opening the modem with `diagnostic`
    pub fn open_error<S: Into<String>>(mut self, diagnostic: S) -> Self {
        self.open_error = Some(diagnostic.into());
        self
    }

    /// Fail reading the link database with `diagnostic`
    pub fn database_error<S: Into<String>>(mut self, diagnostic: S) -> Self {
        self.database_error = Some(diagnostic.into());
        self
    }

    /// Finish the driver
    pub fn build(self) -> SimulatedDriver {
        SimulatedDriver {
            state: Arc::new(SimulatedState {
                open_error: self.open_error,
                database_error: self.database_error,
                devices: self.devices,
                ..SimulatedState::default()
            }),
        }
    }
}

#[async_trait]
impl PowerlineDriver for SimulatedDriver {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn open(&self, port: &str) -> TransportResult<Box<dyn ModemSession>> {
        lock(&self.state.opened_ports).push(port.to_string());
        if let Some(diagnostic) = &self.state.open_error {
            return Err(TransportError::new(diagnostic.clone()));
        }
        Ok(Box::new(SimulatedSession {
            port: port.to_string(),
            state: self.state.clone(),
        }))
    }
}

struct SimulatedSession {
    port: String,
    state: Arc<SimulatedState>,
}

impl fmt::Debug for SimulatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedSession")
            .field("port", &self.port)
            .field("devices", &self.state.devices.len())
            .finish()
    }
}

#[async_trait]
impl ModemSession for SimulatedSession {
    async fn read_link_database(&self) -> TransportResult<Vec<LinkRecord>> {
        *lock(&self.state.database_reads) += 1;
        if let Some(diagnostic) = &self.state.database_error {
            return Err(TransportError::new(diagnostic.clone()));
        }
        Ok(self.state.devices.iter().map(SimulatedDevice::record).collect())
    }

    async fn connect(&self, device_id: &DeviceId) -> TransportResult<DriverConnection> {
        lock(&self.state.connect_attempts).push(device_id.clone());

        let device = self
            .state
            .devices
            .iter()
            .find(|d| &d.info.id == device_id)
            .ok_or_else(|| TransportError::new(format!("no acknowledgement from {}", device_id)))?;

        if let Some(diagnostic) = &device.connect_error {
            return Err(TransportError::new(diagnostic.clone()));
        }

        debug!("Simulated device {} answered on {}", device_id, self.port);
        Ok(DriverConnection {
            info: device.info.clone(),
            link: Box::new(SimulatedLink {
                device_id: device_id.clone(),
                send_error: device.send_error.clone(),
                state: self.state.clone(),
            }),
        })
    }
}

struct SimulatedLink {
    device_id: DeviceId,
    send_error: Option<String>,
    state: Arc<SimulatedState>,
}

impl fmt::Debug for SimulatedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedLink")
            .field("device_id", &self.device_id)
            .field("send_error", &self.send_error)
            .finish()
    }
}

#[async_trait]
impl DeviceLink for SimulatedLink {
    async fn send(&self, command: LightCommand) -> TransportResult<()> {
        lock(&self.state.sent_commands).push((self.device_id.clone(), command));
        match &self.send_error {
            Some(diagnostic) => Err(TransportError::new(diagnostic.clone())),
            None => Ok(()),
        }
    }
}
