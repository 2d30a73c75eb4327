use std::time::Duration;

use anyhow::Context;
use backon::{BlockingRetryable, ConstantBuilder};
use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};
use tokio::time::MissedTickBehavior;

use crate::{
    ess::Ess,
    leds::StatusLeds,
    measurement::Measurement,
    sps30::Sps30,
    upload::{UploadPayload, Uplink},
};

/// Runs `probe` until it succeeds, pausing `delay` between attempts.
pub fn probe_until_ready<T>(
    name: &str,
    delay: Duration,
    probe: impl FnMut() -> Result<T, anyhow::Error>,
) -> Result<T, anyhow::Error> {
    let retry_builder = ConstantBuilder::default()
        .with_delay(delay)
        .without_max_times();

    probe
        .retry(retry_builder)
        .notify(|e, dur| {
            log::error!("{name} probing failed: {e:#}");
            log::info!("Retrying in {:?}", dur);
        })
        .call()
}

#[derive(Debug)]
pub struct Monitor<I, D, P> {
    ess: Ess<I, D>,
    sps30: Sps30<I, D>,
    leds: Option<StatusLeds<P>>,
    uplink: Option<Uplink>,
}

impl<I: I2c, D: DelayNs, P: OutputPin> Monitor<I, D, P> {
    pub fn new(
        ess: Ess<I, D>,
        sps30: Sps30<I, D>,
        leds: Option<StatusLeds<P>>,
        uplink: Option<Uplink>,
    ) -> Self {
        Self {
            ess,
            sps30,
            leds,
            uplink,
        }
    }

    /// Blocks until both sensor units answer. The ESS is probed first.
    pub fn probe(&mut self, delay: Duration) -> Result<(), anyhow::Error> {
        probe_until_ready("ESS", delay, || self.ess.init())?;
        log::info!("ESS probing successful");

        probe_until_ready("SPS30", delay, || self.sps30.probe())?;
        log::info!("SPS sensor probing successful");

        Ok(())
    }

    pub fn configure(&mut self, auto_clean_days: u8) {
        if let Err(e) = self
            .sps30
            .set_fan_auto_cleaning_interval_days(auto_clean_days)
        {
            log::error!("Failed to set the auto-clean interval: {e:#}");
        }

        if let Err(e) = self.sps30.start_measurement() {
            log::error!("Failed to start measurement: {e:#}");
        }
        log::info!("measurements started");
    }

    /// Reads every sensor once. Failed or not-ready reads leave their field
    /// empty; nothing carries over from earlier cycles.
    pub fn sample(&mut self) -> Measurement {
        let mut measurement = Measurement::new();

        match self.ess.measure_iaq() {
            Ok(iaq) => {
                log::info!("{iaq}");
                measurement.iaq = Some(iaq);
            }
            Err(e) => log::error!("Failed to read IAQ values: {e:#}"),
        }

        match self.ess.measure_rht() {
            Ok(climate) => {
                log::info!("{climate}");
                measurement.climate = Some(climate);
            }
            Err(e) => log::error!("Failed to read RH/T values: {e:#}"),
        }

        match self.sps30.read_data_ready() {
            Ok(true) => match self.sps30.read_measurement() {
                Ok(pm) => {
                    log::info!("{pm}");
                    measurement.particulate = Some(pm);
                }
                Err(e) => log::error!("Failed to read PM measurement: {e:#}"),
            },
            Ok(false) => log::debug!("SPS30 data not ready"),
            Err(e) => log::error!("Failed to read data-ready flag: {e:#}"),
        }

        if let (Some(leds), Some(iaq)) = (self.leds.as_mut(), measurement.iaq.as_ref()) {
            if let Err(e) = leds.show(iaq) {
                log::warn!("{e:#}");
            }
        }

        measurement
    }

    /// Posts on every other call while the network is up.
    pub async fn publish(&mut self, measurement: &Measurement) {
        let Some(uplink) = self.uplink.as_mut() else {
            return;
        };

        if !uplink.due() {
            return;
        }

        let Some(payload) = UploadPayload::from_measurement(measurement) else {
            log::warn!("No fresh readings to upload");
            return;
        };

        if let Err(e) = uplink.send(&payload).await {
            log::error!("Failed to upload measurements: {e:#}");
        }
    }

    /// Samples and publishes once per `period` until the future is dropped.
    pub async fn run(&mut self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let measurement = self.sample();
            self.publish(&measurement).await;
        }
    }

    pub fn shutdown(&mut self) -> Result<(), anyhow::Error> {
        self.sps30
            .stop_measurement()
            .context("Failed to stop SPS30 measurement")
    }
}
