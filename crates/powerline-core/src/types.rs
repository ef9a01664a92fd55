/*!
 * Core data types for the powerline workspace.
 *
 * This module defines the identifiers and capability tiers shared between the
 * configuration layer and the device layer.
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identifier of a paired device within one modem's all-link database.
///
/// Usually an Insteon address such as `1A.2B.3C`. The value is passed to the
/// driver verbatim; it does not imply the device is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device ID from a string
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Get the string representation of the ID
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the ID is empty or only whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Capability tier of a connected device.
///
/// Tiers are cumulative: variants are declared in increasing order, so
/// `a >= b` means "a supports at least the commands of b".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// No commands
    Generic,
    /// On/Off
    #[serde(alias = "lighting")]
    LightingControl,
    /// On/Off plus ramped transitions to a level
    #[serde(alias = "dimmable")]
    DimmableLightingControl,
}

/// Insteon device category for dimmable lighting control
pub const CATEGORY_DIMMABLE_LIGHTING: u8 = 0x01;
/// Insteon device category for switched lighting control
pub const CATEGORY_SWITCHED_LIGHTING: u8 = 0x02;

impl Capability {
    /// Map an Insteon device category byte to a capability tier
    pub fn from_category(category: u8) -> Self {
        match category {
            CATEGORY_DIMMABLE_LIGHTING => Capability::DimmableLightingControl,
            CATEGORY_SWITCHED_LIGHTING => Capability::LightingControl,
            _ => Capability::Generic,
        }
    }

    /// Check whether this tier includes every command of `other`
    pub fn includes(&self, other: Capability) -> bool {
        *self >= other
    }

    /// Whether On/Off commands are available
    pub fn is_lighting(&self) -> bool {
        self.includes(Capability::LightingControl)
    }

    /// Whether ramp commands are available
    pub fn is_dimmable(&self) -> bool {
        self.includes(Capability::DimmableLightingControl)
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Generic => "generic",
            Capability::LightingControl => "lighting-control",
            Capability::DimmableLightingControl => "dimmable-lighting-control",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" => Ok(Capability::Generic),
            "lighting" | "lighting-control" => Ok(Capability::LightingControl),
            "dimmable" | "dimmable-lighting-control" => Ok(Capability::DimmableLightingControl),
            other => Err(Error::invalid_argument(format!("Unknown capability: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_blank() {
        assert!(DeviceId::from("").is_blank());
        assert!(DeviceId::from("   ").is_blank());
        assert!(!DeviceId::from("1A.2B.3C").is_blank());
        assert_eq!(DeviceId::from("1A.2B.3C").to_string(), "1A.2B.3C");
    }

    #[test]
    fn test_capability_tiers_are_cumulative() {
        let dimmable = Capability::DimmableLightingControl;
        assert!(dimmable.includes(Capability::LightingControl));
        assert!(dimmable.includes(Capability::Generic));
        assert!(dimmable.is_lighting());

        let switched = Capability::LightingControl;
        assert!(switched.is_lighting());
        assert!(!switched.is_dimmable());

        assert!(!Capability::Generic.is_lighting());
    }

    #[test]
    fn test_capability_from_category() {
        assert_eq!(Capability::from_category(0x01), Capability::DimmableLightingControl);
        assert_eq!(Capability::from_category(0x02), Capability::LightingControl);
        assert_eq!(Capability::from_category(0x10), Capability::Generic);
    }

    #[test]
    fn test_capability_parse() {
        assert_eq!("dimmable".parse::<Capability>().unwrap(), Capability::DimmableLightingControl);
        assert_eq!("Lighting-Control".parse::<Capability>().unwrap(), Capability::LightingControl);
        assert!("thermostat".parse::<Capability>().is_err());
    }
}
