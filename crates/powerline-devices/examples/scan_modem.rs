use futures::StreamExt;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use powerline_devices::drivers::{SimulatedDevice, SimulatedDriver};
use powerline_devices::{apply_light_state, Capability, Modem, PowerState, ScanSummary};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // A modem with a hallway dimmer, an unreachable porch switch and a motion sensor
    let driver = SimulatedDriver::builder()
        .device(
            SimulatedDevice::new("1A.2B.3C", Capability::Generic)
                .with_category(0x01, Some(0x20))
                .with_description("Hallway dimmer"),
        )
        .device(
            SimulatedDevice::new("4D.5E.6F", Capability::LightingControl)
                .with_description("Porch switch")
                .failing_connect("timeout"),
        )
        .device(SimulatedDevice::new("70.81.92", Capability::Generic).with_description("Motion sensor"))
        .build();

    let modem = Modem::open(&driver, "COM4").await?;

    let database = modem.link_database().await?;
    info!("{} records in the all-link database", database.len());

    let outcomes = modem.connect_all().await?;
    futures::pin_mut!(outcomes);

    let mut summary = ScanSummary::default();
    while let Some((id, outcome)) = outcomes.next().await {
        summary.record(&outcome);
        let device = match outcome {
            Ok(device) => device,
            Err(err) => {
                warn!("{} unreachable: {}", id, err);
                continue;
            }
        };

        info!("{} is a {}", id, device.capability());
        if device.as_dimmable().is_some() {
            apply_light_state(&device, PowerState::On, true, 200).await?;
            apply_light_state(&device, PowerState::Off, true, 128).await?;
        } else if device.as_lighting().is_some() {
            apply_light_state(&device, PowerState::On, false, 128).await?;
        }
    }

    info!("{} connected, {} failed", summary.connected, summary.failed);
    info!("Commands sent: {:?}", driver.sent_commands());

    Ok(())
}
