use embedded_hal::digital::OutputPin;

use crate::measurement::IaqReading;

pub const TVOC_GOOD_PPB: u16 = 250;
pub const TVOC_MODERATE_PPB: u16 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    Good,
    Moderate,
    Poor,
}

impl AirQuality {
    pub fn from_tvoc(tvoc_ppb: u16) -> Self {
        if tvoc_ppb < TVOC_GOOD_PPB {
            AirQuality::Good
        } else if tvoc_ppb < TVOC_MODERATE_PPB {
            AirQuality::Moderate
        } else {
            AirQuality::Poor
        }
    }
}

/// Traffic-light LEDs on the ESS. Exactly one is lit at a time.
#[derive(Debug)]
pub struct StatusLeds<P> {
    red: P,
    yellow: P,
    green: P,
}

impl<P: OutputPin> StatusLeds<P> {
    pub fn new(red: P, yellow: P, green: P) -> Self {
        Self { red, yellow, green }
    }

    pub fn show(&mut self, iaq: &IaqReading) -> Result<(), anyhow::Error> {
        let quality = AirQuality::from_tvoc(iaq.tvoc_ppb);

        set(&mut self.red, quality == AirQuality::Poor)?;
        set(&mut self.yellow, quality == AirQuality::Moderate)?;
        set(&mut self.green, quality == AirQuality::Good)?;

        Ok(())
    }
}

fn set<P: OutputPin>(pin: &mut P, on: bool) -> Result<(), anyhow::Error> {
    let result = if on { pin.set_high() } else { pin.set_low() };
    result.map_err(|e| anyhow::anyhow!("Failed to drive LED: {e:?}"))
}
