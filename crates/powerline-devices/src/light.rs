/*!
 * Light command executor.
 *
 * Turns a requested power state and transition mode into the single command
 * the device's capability tier accepts, then dispatches it. Validation
 * happens in a fixed order, all before any I/O: ramp level range first, then
 * capability. Dispatch is fire-and-forget; the device state is not read back.
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};

use powerline_core::logging::operation_span;

use crate::device::{Device, LightCommand, RampLevel};
use crate::error::{PowerlineError, Result};

/// Requested power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    /// Light on
    On,
    /// Light off
    Off,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => f.write_str("on"),
            PowerState::Off => f.write_str("off"),
        }
    }
}

impl FromStr for PowerState {
    type Err = PowerlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "on" => Ok(PowerState::On),
            "off" => Ok(PowerState::Off),
            other => Err(PowerlineError::invalid_argument(format!(
                "unknown power state: {}",
                other
            ))),
        }
    }
}

/// How the transition happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    /// Switch at once
    Immediate,
    /// Ramp gradually
    Ramped,
}

/// A requested light state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightRequest {
    /// Target power state
    pub state: PowerState,
    /// Transition mode
    pub mode: TransitionMode,
    /// Level to ramp on to; checked on every request, used only for ramped On
    pub ramp_level: i32,
}

impl Default for LightRequest {
    fn default() -> Self {
        Self {
            state: PowerState::On,
            mode: TransitionMode::Immediate,
            ramp_level: i32::from(RampLevel::default().get()),
        }
    }
}

impl LightRequest {
    /// Build a request from the flat argument form
    pub fn new(state: PowerState, ramped: bool, ramp_level: i32) -> Self {
        Self {
            state,
            mode: if ramped {
                TransitionMode::Ramped
            } else {
                TransitionMode::Immediate
            },
            ramp_level,
        }
    }

    /// Immediate on
    pub fn on() -> Self {
        Self::default()
    }

    /// Immediate off
    pub fn off() -> Self {
        Self {
            state: PowerState::Off,
            ..Self::default()
        }
    }

    /// Switch to a ramped transition to `level`
    pub fn ramped(mut self, level: i32) -> Self {
        self.mode = TransitionMode::Ramped;
        self.ramp_level = level;
        self
    }

    /// The command this request maps to, independent of any device
    pub fn command(&self) -> Result<LightCommand> {
        let level = RampLevel::new(self.ramp_level)?;
        Ok(match (self.state, self.mode) {
            (PowerState::On, TransitionMode::Immediate) => LightCommand::TurnOn,
            (PowerState::Off, TransitionMode::Immediate) => LightCommand::TurnOff,
            (PowerState::On, TransitionMode::Ramped) => LightCommand::RampOn(level),
            (PowerState::Off, TransitionMode::Ramped) => LightCommand::RampOff,
        })
    }

    /// Apply the request to a device; see [`apply_light_state`]
    pub async fn apply(&self, device: &Device) -> Result<LightCommand> {
        let command = self.command()?;
        let span = operation_span("apply_light_state", device.id().as_str());
        async {
            debug!(state = %self.state, mode = ?self.mode, "Resolved {}", command);
            let required = command.required_capability();
            match command {
                LightCommand::TurnOn | LightCommand::TurnOff => {
                    let light = device.as_lighting().ok_or_else(|| {
                        device.unsupported(required, "on/off requires a lighting control device")
                    })?;
                    if command == LightCommand::TurnOn {
                        light.turn_on().await?;
                    } else {
                        light.turn_off().await?;
                    }
                }
                LightCommand::RampOn(_) | LightCommand::RampOff => {
                    let dimmer = device.as_dimmable().ok_or_else(|| {
                        device.unsupported(required, "ramping requires a dimmable device")
                    })?;
                    match command {
                        LightCommand::RampOn(level) => dimmer.ramp_on(level).await?,
                        _ => dimmer.ramp_off().await?,
                    }
                }
            }
            Ok::<_, PowerlineError>(command)
        }
        .instrument(span)
        .await
    }
}

/// Drive a light to `state`, optionally ramped
///
/// * `ramp_level` outside 1..=255 is [`PowerlineError::InvalidArgument`] for
///   any device, checked first.
/// * A ramp on a device below the dimmable tier, or any command on a generic
///   device, is [`PowerlineError::UnsupportedCapability`].
/// * Otherwise exactly one command is sent: `TurnOn`/`TurnOff`, or
///   `RampOn(level)`/`RampOff`. Ramp off ignores the level.
/// * A driver failure is [`PowerlineError::CommandDispatch`]; nothing is retried.
///
/// Returns the command that was sent.
pub async fn apply_light_state(
    device: &Device,
    state: PowerState,
    ramped: bool,
    ramp_level: i32,
) -> Result<LightCommand> {
    LightRequest::new(state, ramped, ramp_level).apply(device).await
}
