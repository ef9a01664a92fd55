use futures::StreamExt;
use tokio_test::{assert_err, assert_ok};

use powerline_devices::drivers::{SimulatedDevice, SimulatedDriver};
use powerline_devices::{api, Capability, DeviceId, Modem, ScanSummary};

fn three_device_driver() -> SimulatedDriver {
    SimulatedDriver::builder()
        .device(SimulatedDevice::new("A", Capability::DimmableLightingControl))
        .device(SimulatedDevice::new("B", Capability::LightingControl).failing_connect("timeout"))
        .device(SimulatedDevice::new("C", Capability::LightingControl))
        .build()
}

#[test_log::test(tokio::test)]
async fn connect_device_reports_driver_capability() {
    let driver = SimulatedDriver::builder()
        .device(SimulatedDevice::new("11.11.11", Capability::Generic))
        .device(SimulatedDevice::new("22.22.22", Capability::LightingControl))
        .device(SimulatedDevice::new("33.33.33", Capability::DimmableLightingControl))
        .build();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    for (id, expected) in [
        ("11.11.11", Capability::Generic),
        ("22.22.22", Capability::LightingControl),
        ("33.33.33", Capability::DimmableLightingControl),
    ] {
        let device = assert_ok!(modem.connect_device(&DeviceId::from(id)).await);
        assert_eq!(device.id().as_str(), id);
        assert_eq!(device.capability(), expected);
    }
}

#[tokio::test]
async fn connect_device_rejects_empty_id_without_io() {
    let driver = three_device_driver();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    for id in ["", "   "] {
        let err = assert_err!(modem.connect_device(&DeviceId::from(id)).await);
        assert!(err.is_invalid_argument());
    }
    assert!(driver.connect_attempts().is_empty());
}

#[tokio::test]
async fn connect_device_failure_keeps_diagnostic() {
    let driver = three_device_driver();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    let err = assert_err!(modem.connect_device(&DeviceId::from("B")).await);
    assert!(err.is_connection());
    assert_eq!(err.diagnostic(), Some("timeout"));
    assert_eq!(modem.last_error().map(|e| e.diagnostic().to_string()), Some("timeout".to_string()));
    assert_eq!(driver.connect_attempts(), vec![DeviceId::from("B")]);
}

#[tokio::test]
async fn connecting_twice_gives_independent_handles() {
    let driver = three_device_driver();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);
    let id = DeviceId::from("A");

    let first = assert_ok!(modem.connect_device(&id).await);
    let second = assert_ok!(modem.connect_device(&id).await);
    drop(first);
    assert_eq!(second.id(), &id);
    assert_eq!(driver.connect_attempts().len(), 2);
}

#[test_log::test(tokio::test)]
async fn connect_all_continues_past_failures_in_order() {
    let driver = three_device_driver();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    let outcomes: Vec<_> = assert_ok!(modem.connect_all().await).collect().await;

    assert_eq!(outcomes.len(), 3);
    let ids: Vec<&str> = outcomes.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);

    let a = outcomes[0].1.as_ref().unwrap();
    assert_eq!(a.id().as_str(), "A");
    assert_eq!(a.capability(), Capability::DimmableLightingControl);

    let b = outcomes[1].1.as_ref().unwrap_err();
    assert!(b.is_connection());
    assert_eq!(b.diagnostic(), Some("timeout"));

    let c = outcomes[2].1.as_ref().unwrap();
    assert_eq!(c.id().as_str(), "C");

    // one attempt per record, no retries
    assert_eq!(
        driver.connect_attempts(),
        vec![DeviceId::from("A"), DeviceId::from("B"), DeviceId::from("C")]
    );
}

#[tokio::test]
async fn connect_all_yields_one_outcome_per_record_when_all_fail() {
    let mut builder = SimulatedDriver::builder();
    for i in 0..5 {
        builder = builder.device(
            SimulatedDevice::new(format!("0{}.00.00", i), Capability::LightingControl)
                .failing_connect("no ack"),
        );
    }
    let driver = builder.build();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    let mut summary = ScanSummary::default();
    let outcomes: Vec<_> = assert_ok!(modem.connect_all().await).collect().await;
    for (_, outcome) in &outcomes {
        summary.record(outcome);
    }
    assert_eq!(summary.total(), 5);
    assert_eq!(summary.failed, 5);
    assert_eq!(summary.connected, 0);
}

#[tokio::test]
async fn connect_all_is_lazy() {
    let driver = three_device_driver();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    let stream = assert_ok!(modem.connect_all().await);
    futures::pin_mut!(stream);
    assert!(driver.connect_attempts().is_empty());

    let (first, _) = stream.next().await.unwrap();
    assert_eq!(first.as_str(), "A");
    assert_eq!(driver.connect_attempts().len(), 1);
}

#[tokio::test]
async fn connect_all_restarts_from_a_fresh_read() {
    let driver = three_device_driver();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    let first: Vec<_> = assert_ok!(modem.connect_all().await).take(1).collect().await;
    let second: Vec<_> = assert_ok!(modem.connect_all().await).collect().await;
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 3);
    assert_eq!(driver.database_reads(), 2);
}

#[tokio::test]
async fn connect_all_fails_when_database_unreadable() {
    let driver = SimulatedDriver::builder().database_error("checksum").build();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    let err = match modem.connect_all().await {
        Ok(_) => panic!("expected the database read to fail"),
        Err(err) => err,
    };
    assert!(err.is_modem_communication());
    assert_eq!(err.diagnostic(), Some("checksum"));
    assert!(driver.connect_attempts().is_empty());
}

#[tokio::test]
async fn connect_all_on_empty_database_yields_nothing() {
    let driver = SimulatedDriver::default();
    let modem = assert_ok!(Modem::open(&driver, "COM4").await);

    let outcomes: Vec<_> = assert_ok!(modem.connect_all().await).collect().await;
    assert!(outcomes.is_empty());
    assert!(driver.connect_attempts().is_empty());
    assert!(modem.last_error().is_none());
}

#[test_log::test(tokio::test)]
async fn api_get_devices_matches_connect_all() {
    let driver = three_device_driver();
    let modem = assert_ok!(api::get_modem(&driver, "COM4").await);

    let outcomes: Vec<_> = assert_ok!(api::get_devices(&modem).await).collect().await;
    let ids: Vec<&str> = outcomes.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);

    let mut summary = ScanSummary::default();
    for (_, result) in &outcomes {
        summary.record(result);
    }
    assert_eq!(summary, ScanSummary { connected: 2, failed: 1 });
    assert_eq!(outcomes[1].1.as_ref().err().and_then(|e| e.diagnostic()), Some("timeout"));
}

#[tokio::test]
async fn api_get_device_connects_one_device() {
    let driver = three_device_driver();
    let modem = assert_ok!(api::get_modem(&driver, "COM4").await);

    let device = assert_ok!(api::get_device(&modem, &DeviceId::from("A")).await);
    assert_eq!(device.capability(), Capability::DimmableLightingControl);

    let err = assert_err!(api::get_device(&modem, &DeviceId::from("B")).await);
    assert!(err.is_connection());

    let err = assert_err!(api::get_device(&modem, &DeviceId::from("")).await);
    assert!(err.is_invalid_argument());
    assert_eq!(driver.connect_attempts(), vec![DeviceId::from("A"), DeviceId::from("B")]);
}
