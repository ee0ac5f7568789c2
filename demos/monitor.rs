//! Passive thermometer monitor example
//!
//! Run with: cargo run --example monitor [ADDRESS]
//!
//! Without an address the monitor locks onto the first thermometer heard.
//! Set `RUST_LOG=dinuso_rust_ble=debug` to see every advertisement decision.

use dinuso_rust_ble::{
    celsius_to_fahrenheit, BtleplugSource, ConnectionSnapshot, Result, ThermometerConfig,
    ThermometerMonitor,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let mut config = ThermometerConfig::default();
    if let Some(address) = std::env::args().nth(1) {
        config = config.with_target_address(&address)?;
    }

    println!("DINUSO Thermometer Monitor");
    println!("==========================\n");
    match config.target_address {
        Some(ref address) => println!("Listening for {}...", address),
        None => println!("Listening for the first thermometer in range..."),
    }
    println!("Press Ctrl+C to exit.\n");

    let source = Arc::new(BtleplugSource::new().await?);
    let monitor = ThermometerMonitor::new(config, source)?;
    let mut updates = monitor.subscribe();
    monitor.start().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting...");
                break;
            }
            update = updates.recv() => match update {
                Ok(snapshot) => display_snapshot(&snapshot),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    monitor.stop().await;

    println!("\nLast known sensor values:");
    for view in monitor.views() {
        let value = view
            .value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "--".to_string());
        println!(
            "  {:<20} {:>10} {}",
            view.name,
            value,
            view.unit.unwrap_or("")
        );
    }

    Ok(())
}

fn display_snapshot(snapshot: &ConnectionSnapshot) {
    let status = if snapshot.connected {
        "connected"
    } else {
        "disconnected"
    };

    let temperature = match snapshot.temperature {
        Some(celsius) => format!(
            "{:6.1}°C ({:6.1}°F)",
            celsius,
            celsius_to_fahrenheit(celsius)
        ),
        None => "--".to_string(),
    };

    let battery = match snapshot.battery_percent {
        Some(percent) => format!("{}%", percent),
        None => "--".to_string(),
    };

    let rssi = match snapshot.rssi {
        Some(rssi) => format!("{} dBm", rssi),
        None => "--".to_string(),
    };

    println!(
        "[{}] {} | battery {} | signal {} ({}) | {}",
        snapshot.address.as_deref().unwrap_or("?"),
        temperature,
        battery,
        rssi,
        snapshot.connection_quality,
        status
    );
}
