/*!
 * All-link database records.
 *
 * A [`LinkDatabase`] is a snapshot of the modem's table of paired devices,
 * taken when it was requested and kept in the order the modem stores it.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use powerline_core::types::DeviceId;

/// One paired device in the modem's all-link database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Address of the paired device
    pub device_id: DeviceId,
    /// All-link group, when the modem reports it
    #[serde(default)]
    pub group: Option<u8>,
    /// Whether the modem is the controller of this link
    #[serde(default)]
    pub controller: bool,
}

impl LinkRecord {
    /// Create a record for a device
    pub fn new<I: Into<DeviceId>>(device_id: I) -> Self {
        Self {
            device_id: device_id.into(),
            group: None,
            controller: false,
        }
    }

    /// Set the all-link group
    pub fn with_group(mut self, group: u8) -> Self {
        self.group = Some(group);
        self
    }

    /// Mark the modem as controller of the link
    pub fn as_controller(mut self) -> Self {
        self.controller = true;
        self
    }
}

/// Snapshot of a modem's all-link database
#[derive(Debug, Clone, Serialize)]
pub struct LinkDatabase {
    port: String,
    fetched_at: DateTime<Utc>,
    records: Vec<LinkRecord>,
}

impl LinkDatabase {
    /// Wrap the records read from the modem on `port`
    pub fn new<S: Into<String>>(port: S, records: Vec<LinkRecord>) -> Self {
        Self {
            port: port.into(),
            fetched_at: Utc::now(),
            records,
        }
    }

    /// Transport identifier of the modem the snapshot was read from
    pub fn port(&self) -> &str {
        &self.port
    }

    /// When the snapshot was read
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// The records in database order
    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the database has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate the records in database order
    pub fn iter(&self) -> std::slice::Iter<'_, LinkRecord> {
        self.records.iter()
    }

    /// Whether a device is listed
    pub fn contains(&self, device_id: &DeviceId) -> bool {
        self.records.iter().any(|r| &r.device_id == device_id)
    }

    /// Device IDs in database order
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.records.iter().map(|r| r.device_id.clone()).collect()
    }
}

impl IntoIterator for LinkDatabase {
    type Item = LinkRecord;
    type IntoIter = std::vec::IntoIter<LinkRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a LinkDatabase {
    type Item = &'a LinkRecord;
    type IntoIter = std::slice::Iter<'a, LinkRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
