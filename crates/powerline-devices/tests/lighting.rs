use tokio_test::{assert_err, assert_ok};

use powerline_devices::drivers::{SimulatedDevice, SimulatedDriver};
use powerline_devices::{
    api, apply_light_state, Capability, Device, DeviceId, LightCommand, LightRequest, Modem,
    PowerState, PowerlineError, RampLevel,
};

async fn connect(driver: &SimulatedDriver, id: &str) -> (Modem, Device) {
    let modem = assert_ok!(Modem::open(driver, "COM4").await);
    let device = assert_ok!(modem.connect_device(&DeviceId::from(id)).await);
    (modem, device)
}

fn driver() -> SimulatedDriver {
    SimulatedDriver::builder()
        .device(SimulatedDevice::new("dimmer", Capability::DimmableLightingControl))
        .device(SimulatedDevice::new("switch", Capability::LightingControl))
        .device(SimulatedDevice::new("sensor", Capability::Generic))
        .device(SimulatedDevice::new("flaky", Capability::DimmableLightingControl).failing_send("nak"))
        .build()
}

#[test_log::test(tokio::test)]
async fn ramp_on_dimmable_sends_one_ramp_on() {
    let driver = driver();
    let (_modem, device) = connect(&driver, "dimmer").await;

    let command = assert_ok!(api::set_light(&device, PowerState::On, true, 200).await);

    let expected = LightCommand::RampOn(RampLevel::new(200).unwrap());
    assert_eq!(command, expected);
    assert_eq!(driver.sent_commands(), vec![(DeviceId::from("dimmer"), expected)]);
}

#[tokio::test]
async fn ramp_off_ignores_level() {
    let driver = driver();
    let (_modem, device) = connect(&driver, "dimmer").await;

    for level in [1, 128, 255] {
        let command = assert_ok!(apply_light_state(&device, PowerState::Off, true, level).await);
        assert_eq!(command, LightCommand::RampOff);
    }
    let sent: Vec<LightCommand> = driver.sent_commands().into_iter().map(|(_, c)| c).collect();
    assert_eq!(sent, vec![LightCommand::RampOff; 3]);
}

#[tokio::test]
async fn ramp_on_non_dimmable_is_rejected_without_send() {
    let driver = driver();
    let (_modem, device) = connect(&driver, "switch").await;

    for _ in 0..2 {
        let err = assert_err!(apply_light_state(&device, PowerState::On, true, 128).await);
        assert!(err.is_unsupported_capability());
        assert!(err.to_string().contains("ramping requires a dimmable device"));
    }
    let err = assert_err!(apply_light_state(&device, PowerState::Off, true, 128).await);
    assert!(err.is_unsupported_capability());
    assert!(driver.sent_commands().is_empty());
}

#[tokio::test]
async fn rejection_names_the_tier_the_command_needs() {
    let driver = driver();
    let (_modem, switch) = connect(&driver, "switch").await;
    let (_modem2, sensor) = connect(&driver, "sensor").await;

    let err = assert_err!(apply_light_state(&switch, PowerState::On, true, 128).await);
    match err {
        PowerlineError::UnsupportedCapability { required, actual, .. } => {
            assert_eq!(required, LightCommand::RampOn(RampLevel::default()).required_capability());
            assert_eq!(required, Capability::DimmableLightingControl);
            assert_eq!(actual, Capability::LightingControl);
        }
        other => panic!("expected unsupported capability, got {:?}", other),
    }

    let err = assert_err!(apply_light_state(&sensor, PowerState::Off, false, 128).await);
    match err {
        PowerlineError::UnsupportedCapability { required, actual, .. } => {
            assert_eq!(required, LightCommand::TurnOff.required_capability());
            assert_eq!(actual, Capability::Generic);
        }
        other => panic!("expected unsupported capability, got {:?}", other),
    }
}

#[tokio::test]
async fn immediate_commands_on_lighting_devices() {
    let driver = driver();
    let (_modem, switch) = connect(&driver, "switch").await;
    let (_modem2, dimmer) = connect(&driver, "dimmer").await;

    assert_eq!(
        assert_ok!(apply_light_state(&switch, PowerState::On, false, 128).await),
        LightCommand::TurnOn
    );
    assert_eq!(
        assert_ok!(apply_light_state(&switch, PowerState::Off, false, 128).await),
        LightCommand::TurnOff
    );
    // a dimmable device is also a lighting control
    assert_eq!(
        assert_ok!(LightRequest::on().apply(&dimmer).await),
        LightCommand::TurnOn
    );
    assert_eq!(driver.sent_commands().len(), 3);
}

#[tokio::test]
async fn generic_device_accepts_no_light_command() {
    let driver = driver();
    let (_modem, device) = connect(&driver, "sensor").await;

    let err = assert_err!(apply_light_state(&device, PowerState::On, false, 128).await);
    assert!(err.is_unsupported_capability());
    assert!(device.as_lighting().is_none());
    assert!(driver.sent_commands().is_empty());
}

#[tokio::test]
async fn ramp_level_bounds_apply_to_every_device() {
    let driver = driver();
    let (_modem, dimmer) = connect(&driver, "dimmer").await;
    let (_modem2, sensor) = connect(&driver, "sensor").await;

    for device in [&dimmer, &sensor] {
        for level in [0, 256] {
            let err = assert_err!(apply_light_state(device, PowerState::On, true, level).await);
            assert!(err.is_invalid_argument());
            let err = assert_err!(apply_light_state(device, PowerState::Off, false, level).await);
            assert!(err.is_invalid_argument());
        }
    }
    assert!(driver.sent_commands().is_empty());

    assert_ok!(apply_light_state(&dimmer, PowerState::On, true, 1).await);
    assert_ok!(apply_light_state(&dimmer, PowerState::On, true, 255).await);
    assert_eq!(driver.sent_commands().len(), 2);
}

#[tokio::test]
async fn dispatch_failure_is_surfaced_and_not_retried() {
    let driver = driver();
    let (_modem, device) = connect(&driver, "flaky").await;

    let err = assert_err!(apply_light_state(&device, PowerState::On, true, 64).await);
    assert!(err.is_command_dispatch());
    assert_eq!(err.diagnostic(), Some("nak"));
    assert_eq!(driver.sent_commands().len(), 1);
}

#[tokio::test]
async fn dispatch_failure_is_recorded_on_the_modem() {
    let driver = driver();
    let (modem, device) = connect(&driver, "flaky").await;
    assert!(modem.last_error().is_none());

    assert_err!(apply_light_state(&device, PowerState::Off, false, 128).await);
    assert_eq!(
        modem.last_error().map(|e| e.diagnostic().to_string()),
        Some("nak".to_string())
    );

    // a rejected command never reaches the driver, so nothing new is recorded
    let (modem2, switch) = connect(&driver, "switch").await;
    assert_err!(apply_light_state(&switch, PowerState::On, true, 128).await);
    assert!(modem2.last_error().is_none());
}

#[tokio::test]
async fn typed_views_follow_capability() {
    let driver = driver();
    let (_modem, dimmer) = connect(&driver, "dimmer").await;
    let (_modem2, switch) = connect(&driver, "switch").await;

    assert!(dimmer.as_dimmable().is_some());
    assert!(dimmer.as_lighting().is_some());
    assert!(switch.as_dimmable().is_none());

    let view = dimmer.as_dimmable().unwrap();
    assert_ok!(view.ramp_on(RampLevel::default()).await);
    assert_ok!(view.as_lighting().turn_off().await);
    assert_eq!(
        driver.sent_commands(),
        vec![
            (DeviceId::from("dimmer"), LightCommand::RampOn(RampLevel::default())),
            (DeviceId::from("dimmer"), LightCommand::TurnOff),
        ]
    );
}
