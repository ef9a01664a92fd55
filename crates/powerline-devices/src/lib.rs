/*!
 * Powerline Devices
 *
 * This crate reads a powerline modem's all-link database, connects the
 * devices it lists and drives lighting devices according to their capability
 * tier. The serial transport and frame codec sit behind the traits in
 * [`driver`]; [`drivers::simulated`] provides an in-memory implementation.
 *
 * ```no_run
 * use futures::StreamExt;
 * use powerline_devices::drivers::SimulatedDriver;
 * use powerline_devices::{Modem, PowerState};
 *
 * # async fn run() -> powerline_devices::Result<()> {
 * let driver = SimulatedDriver::default();
 * let modem = Modem::open(&driver, "COM4").await?;
 * let outcomes: Vec<_> = modem.connect_all().await?.collect().await;
 * for (id, outcome) in &outcomes {
 *     if let Ok(device) = outcome {
 *         if device.as_dimmable().is_some() {
 *             powerline_devices::apply_light_state(device, PowerState::On, true, 200).await?;
 *         }
 *     } else {
 *         println!("{} unreachable", id);
 *     }
 * }
 * # Ok(())
 * # }
 * ```
 */

#![warn(missing_docs)]

pub mod api;
pub mod connection;
pub mod database;
pub mod device;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod light;
pub mod modem;

pub use powerline_core::types::{Capability, DeviceId};

pub use connection::{DeviceOutcome, ScanSummary};
pub use database::{LinkDatabase, LinkRecord};
pub use device::{
    Device, DeviceInfo, DimmableLightingControl, LightCommand, LightingControl, RampLevel,
};
pub use driver::{DeviceLink, DriverConnection, ModemSession, PowerlineDriver, TransportError};
pub use error::{PowerlineError, Result};
pub use light::{apply_light_state, LightRequest, PowerState, TransitionMode};
pub use modem::Modem;

/// Powerline devices crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
