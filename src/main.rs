use anyhow::Context;
use ess::Ess;
use leds::StatusLeds;
use log::LevelFilter;
use monitor::Monitor;
use rppal::{
    gpio::{Gpio, OutputPin},
    hal::Delay,
    i2c::I2c,
};
use sgp30::Sgp30;
use shtc1::Shtc1;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use sps30::Sps30;
use upload::Uplink;

mod config;
mod ess;
mod leds;
mod measurement;
mod monitor;
mod net;
mod sensirion;
mod sgp30;
mod shtc1;
mod sps30;
mod upload;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    TermLogger::init(
        LevelFilter::Info,
        ConfigBuilder::new()
            .set_time_format_rfc3339()
            .set_time_offset_to_local()
            .map_err(|_| anyhow::anyhow!("Failed to set time offset to local"))?
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;

    log::info!("Air Quality Demo");

    if let Err(e) = run().await {
        log::error!("{e:#}");
    }

    Ok(())
}

pub async fn run() -> Result<(), anyhow::Error> {
    let hardware = config::HARDWARE_CONFIG;

    let uplink = bring_up_network().await;

    let ess = Ess::new(
        Sgp30::new(open_bus(hardware.i2c_bus)?, Delay),
        Shtc1::new(open_bus(hardware.i2c_bus)?, Delay),
        hardware.needs_init_workaround,
    );
    let sps30 = Sps30::new(open_bus(hardware.i2c_bus)?, Delay);

    let leds = if hardware.leds_supported {
        Some(open_leds().context("Failed to initialize status LEDs")?)
    } else {
        None
    };

    let mut monitor = Monitor::new(ess, sps30, leds, uplink);

    monitor.probe(config::PROBE_DELAY)?;
    monitor.configure(config::AUTO_CLEAN_DAYS);
    tokio::time::sleep(config::PROBE_DELAY).await;

    tokio::select! {
        _ = monitor.run(config::LOOP_PERIOD) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to wait for Ctrl+C signal")?;
            log::info!("Shutting down");
        }
    }

    monitor.shutdown()
}

/// The network is checked once; later outages only surface as failed uploads.
#[cfg(feature = "upload")]
async fn bring_up_network() -> Option<Uplink> {
    match Uplink::connect(config::UPLOAD_ENDPOINT).await {
        Ok(uplink) => Some(uplink),
        Err(e) => {
            log::error!("Network bring-up failed, uploads disabled: {e:#}");
            None
        }
    }
}

#[cfg(not(feature = "upload"))]
async fn bring_up_network() -> Option<Uplink> {
    log::info!("Data upload disabled at build time");
    None
}

fn open_bus(bus: u8) -> Result<I2c, anyhow::Error> {
    I2c::with_bus(bus).with_context(|| format!("Failed to initialize I2C bus {bus}"))
}

fn open_leds() -> Result<StatusLeds<OutputPin>, anyhow::Error> {
    let gpio = Gpio::new().context("Failed to initialize GPIO")?;
    let pin = |number: u8| -> Result<OutputPin, anyhow::Error> {
        Ok(gpio
            .get(number)
            .with_context(|| format!("Failed to acquire GPIO {number}"))?
            .into_output_low())
    };

    Ok(StatusLeds::new(
        pin(config::LED_RED_PIN)?,
        pin(config::LED_YELLOW_PIN)?,
        pin(config::LED_GREEN_PIN)?,
    ))
}
