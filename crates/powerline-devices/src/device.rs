/*!
 * Device handles and the capability model.
 *
 * A [`Device`] is what a successful connection produces. Its capability tier
 * is fixed at connection time; the command surface for each tier is reached
 * through a typed view ([`LightingControl`], [`DimmableLightingControl`]) that
 * only exists when the tier allows it.
 */
use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use powerline_core::config::{DEFAULT_RAMP_LEVEL, RAMP_LEVEL_MAX, RAMP_LEVEL_MIN};
use powerline_core::types::{Capability, DeviceId};

use crate::driver::{DeviceLink, DriverConnection};
use crate::error::{PowerlineError, Result};
use crate::modem::LastError;

/// Target brightness for a ramp, in the closed range 1..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RampLevel(u8);

impl RampLevel {
    /// Lowest accepted level
    pub const MIN: u8 = RAMP_LEVEL_MIN;
    /// Highest accepted level
    pub const MAX: u8 = RAMP_LEVEL_MAX;

    /// Validate a caller supplied level
    pub fn new(level: i32) -> Result<Self> {
        if level < i32::from(Self::MIN) || level > i32::from(Self::MAX) {
            return Err(PowerlineError::invalid_argument(format!(
                "ramp level {} is outside {}..={}",
                level,
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(level as u8))
    }

    /// The raw level
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for RampLevel {
    fn default() -> Self {
        Self(DEFAULT_RAMP_LEVEL)
    }
}

impl TryFrom<i32> for RampLevel {
    type Error = PowerlineError;

    fn try_from(level: i32) -> Result<Self> {
        Self::new(level)
    }
}

impl fmt::Display for RampLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single command sent to a lighting device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "command", content = "level", rename_all = "kebab-case")]
pub enum LightCommand {
    /// Switch on immediately
    TurnOn,
    /// Switch off immediately
    TurnOff,
    /// Ramp on to a level
    RampOn(RampLevel),
    /// Ramp all the way off; takes no level
    RampOff,
}

impl LightCommand {
    /// The lowest tier that accepts this command
    pub fn required_capability(&self) -> Capability {
        match self {
            LightCommand::TurnOn | LightCommand::TurnOff => Capability::LightingControl,
            LightCommand::RampOn(_) | LightCommand::RampOff => Capability::DimmableLightingControl,
        }
    }
}

impl fmt::Display for LightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightCommand::TurnOn => write!(f, "turn-on"),
            LightCommand::TurnOff => write!(f, "turn-off"),
            LightCommand::RampOn(level) => write!(f, "ramp-on({})", level),
            LightCommand::RampOff => write!(f, "ramp-off"),
        }
    }
}

/// Device information reported at connection time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// The device ID
    pub id: DeviceId,
    /// The capability tier
    pub capability: Capability,
    /// Insteon device category, when reported
    pub category: Option<u8>,
    /// Insteon device subcategory, when reported
    pub subcategory: Option<u8>,
    /// Free-form description, when reported
    pub description: Option<String>,
}

impl DeviceInfo {
    /// Create device information with just an ID and a tier
    pub fn new(id: DeviceId, capability: Capability) -> Self {
        Self {
            id,
            capability,
            category: None,
            subcategory: None,
            description: None,
        }
    }

    /// Set the category bytes
    pub fn with_category(mut self, category: u8, subcategory: Option<u8>) -> Self {
        self.category = Some(category);
        self.subcategory = subcategory;
        self
    }

    /// Set the description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A connected device
///
/// Connecting twice to the same ID gives two independent handles. Command
/// failures are also recorded as the owning modem's [`last_error`].
///
/// [`last_error`]: crate::modem::Modem::last_error
#[derive(Debug)]
pub struct Device {
    info: DeviceInfo,
    link: Box<dyn DeviceLink>,
    last_error: LastError,
}

impl Device {
    pub(crate) fn from_connection(connection: DriverConnection, last_error: LastError) -> Self {
        Self {
            info: connection.info,
            link: connection.link,
            last_error,
        }
    }

    /// Get the device information
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Get the device ID
    pub fn id(&self) -> &DeviceId {
        &self.info.id
    }

    /// Get the capability tier
    pub fn capability(&self) -> Capability {
        self.info.capability
    }

    /// On/Off view, if the device is a lighting control or above
    pub fn as_lighting(&self) -> Option<LightingControl<'_>> {
        match self.capability() {
            Capability::LightingControl | Capability::DimmableLightingControl => {
                Some(LightingControl { device: self })
            }
            Capability::Generic => None,
        }
    }

    /// Ramp view, if the device is dimmable
    pub fn as_dimmable(&self) -> Option<DimmableLightingControl<'_>> {
        match self.capability() {
            Capability::DimmableLightingControl => Some(DimmableLightingControl { device: self }),
            Capability::LightingControl | Capability::Generic => None,
        }
    }

    pub(crate) fn unsupported(&self, required: Capability, message: &str) -> PowerlineError {
        PowerlineError::UnsupportedCapability {
            device_id: self.id().clone(),
            required,
            actual: self.capability(),
            message: message.to_string(),
        }
    }

    async fn dispatch(&self, command: LightCommand) -> Result<()> {
        match self.link.send(command).await {
            Ok(()) => {
                info!(device = %self.id(), %command, "Command dispatched");
                Ok(())
            }
            Err(source) => {
                warn!(device = %self.id(), %command, "Command failed: {}", source);
                self.last_error.record(&source);
                Err(PowerlineError::CommandDispatch {
                    device_id: self.id().clone(),
                    command,
                    source,
                })
            }
        }
    }
}

/// Command surface of a lighting control device
#[derive(Debug, Clone, Copy)]
pub struct LightingControl<'a> {
    device: &'a Device,
}

impl<'a> LightingControl<'a> {
    /// The underlying device
    pub fn device(&self) -> &'a Device {
        self.device
    }

    /// Switch the light on
    pub async fn turn_on(&self) -> Result<()> {
        self.device.dispatch(LightCommand::TurnOn).await
    }

    /// Switch the light off
    pub async fn turn_off(&self) -> Result<()> {
        self.device.dispatch(LightCommand::TurnOff).await
    }
}

/// Command surface of a dimmable lighting control device
#[derive(Debug, Clone, Copy)]
pub struct DimmableLightingControl<'a> {
    device: &'a Device,
}

impl<'a> DimmableLightingControl<'a> {
    /// The underlying device
    pub fn device(&self) -> &'a Device {
        self.device
    }

    /// The On/Off surface every dimmable device also has
    pub fn as_lighting(&self) -> LightingControl<'a> {
        LightingControl {
            device: self.device,
        }
    }

    /// Switch the light on
    pub async fn turn_on(&self) -> Result<()> {
        self.as_lighting().turn_on().await
    }

    /// Switch the light off
    pub async fn turn_off(&self) -> Result<()> {
        self.as_lighting().turn_off().await
    }

    /// Ramp on to `level`
    pub async fn ramp_on(&self, level: RampLevel) -> Result<()> {
        self.device.dispatch(LightCommand::RampOn(level)).await
    }

    /// Ramp fully off
    pub async fn ramp_off(&self) -> Result<()> {
        self.device.dispatch(LightCommand::RampOff).await
    }
}
