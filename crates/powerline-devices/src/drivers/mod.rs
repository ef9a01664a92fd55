/*!
 * Driver implementations.
 *
 * Serial drivers plug in here by implementing
 * [`PowerlineDriver`](crate::driver::PowerlineDriver).
 */
use powerline_core::config::Config;
use powerline_core::error::Error as CoreError;

use crate::driver::PowerlineDriver;
use crate::error::Result;

pub mod simulated;

pub use simulated::{SimulatedDevice, SimulatedDriver, SimulatedDriverBuilder};

/// Names accepted in `modem.driver`
pub fn available_drivers() -> Vec<&'static str> {
    vec!["simulated"]
}

/// Build the driver named in `modem.driver`
pub fn driver_for(config: &Config) -> Result<Box<dyn PowerlineDriver>> {
    match config.modem.driver.as_str() {
        "simulated" => Ok(Box::new(SimulatedDriver::from_config(&config.simulation))),
        other => Err(CoreError::config(format!(
            "Unknown driver {:?}, available: {}",
            other,
            available_drivers().join(", ")
        ))
        .into()),
    }
}
