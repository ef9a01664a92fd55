/*!
 * Caller-facing API.
 *
 * Free functions over [`Modem`] and [`Device`] for callers that prefer a flat
 * surface, plus [`open_configured`] to go from a [`Config`] to an open modem.
 */
use futures::Stream;

use powerline_core::config::Config;
use powerline_core::types::DeviceId;

use crate::connection::DeviceOutcome;
use crate::device::{Device, LightCommand};
use crate::driver::PowerlineDriver;
use crate::drivers::driver_for;
use crate::error::Result;
use crate::light::{apply_light_state, PowerState};
use crate::modem::Modem;

/// Open the modem on `port`
pub async fn get_modem(driver: &dyn PowerlineDriver, port: &str) -> Result<Modem> {
    Modem::open(driver, port).await
}

/// Open the modem described by `modem.port` and `modem.driver`
pub async fn open_configured(config: &Config) -> Result<Modem> {
    let driver = driver_for(config)?;
    Modem::open(driver.as_ref(), &config.modem.port).await
}

/// Connect every device in the link database; see [`Modem::connect_all`]
pub async fn get_devices(modem: &Modem) -> Result<impl Stream<Item = DeviceOutcome> + '_> {
    modem.connect_all().await
}

/// Connect a single device; see [`Modem::connect_device`]
pub async fn get_device(modem: &Modem, device_id: &DeviceId) -> Result<Device> {
    modem.connect_device(device_id).await
}

/// Drive a light; see [`apply_light_state`]
pub async fn set_light(
    device: &Device,
    state: PowerState,
    ramped: bool,
    ramp_level: i32,
) -> Result<LightCommand> {
    apply_light_state(device, state, ramped, ramp_level).await
}
