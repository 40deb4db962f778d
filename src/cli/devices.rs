use tabled::Table;

use crate::{cli, config::Settings, info, types::DeviceTableRow, warning};

/// Lists the devices Spotify currently knows about.
pub async fn devices(settings: &Settings) {
    let mut app = cli::connect(settings);
    if !app.start().await {
        return;
    }

    match app.sync.gateway().devices().await {
        Ok(devices) if devices.is_empty() => {
            info!("No devices found. Open Spotify on a phone, desktop or speaker.")
        }
        Ok(devices) => {
            let rows: Vec<DeviceTableRow> = devices.iter().map(DeviceTableRow::from).collect();
            let table = Table::new(rows);
            println!("{}", table);

            if !devices.iter().any(|d| d.is_active) {
                warning!("No device is active. Start playback on one of them first.");
            }
        }
        Err(e) => warning!("Could not list devices: {}", e),
    }
    app.drain_notices();
}
