use anyhow::Context;
use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{
    measurement::{ClimateReading, IaqReading},
    sgp30::Sgp30,
    shtc1::Shtc1,
};

/// Environmental Sensor Shield: SGP30 gas sensor and SHTC1 humidity and
/// temperature sensor sharing one bus.
#[derive(Debug)]
pub struct Ess<I, D> {
    sgp30: Sgp30<I, D>,
    shtc1: Shtc1<I, D>,
    needs_init_workaround: bool,
}

impl<I: I2c, D: DelayNs> Ess<I, D> {
    pub fn new(sgp30: Sgp30<I, D>, shtc1: Shtc1<I, D>, needs_init_workaround: bool) -> Self {
        Self {
            sgp30,
            shtc1,
            needs_init_workaround,
        }
    }

    /// Probes both sensors and starts the IAQ algorithm.
    pub fn init(&mut self) -> Result<(), anyhow::Error> {
        if self.needs_init_workaround {
            // No ACK is expected from a sensor stuck mid-command.
            if let Err(e) = self.shtc1.soft_reset() {
                log::debug!("SHTC1 soft reset: {e}");
            }
        }

        self.sgp30.probe().context("SGP30 not found")?;
        self.shtc1.probe().context("SHTC1 not found")?;
        self.sgp30
            .iaq_init()
            .context("Failed to start SGP30 IAQ algorithm")?;

        match self.sgp30.get_serial_id() {
            Ok(id) => log::info!("SGP30 serial {id:012x}"),
            Err(e) => log::warn!("Failed to read SGP30 serial id: {e}"),
        }

        Ok(())
    }

    pub fn measure_iaq(&mut self) -> Result<IaqReading, anyhow::Error> {
        self.sgp30.measure_iaq()
    }

    pub fn measure_rht(&mut self) -> Result<ClimateReading, anyhow::Error> {
        self.shtc1.measure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sensirion::encode_words, sgp30, shtc1};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };

    fn sgp30_probe_and_init() -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(sgp30::ADDRESS, vec![0x20, 0x2f]),
            I2cTransaction::read(sgp30::ADDRESS, encode_words(&[0x0020])),
            I2cTransaction::write(sgp30::ADDRESS, vec![0x20, 0x03]),
            I2cTransaction::write(sgp30::ADDRESS, vec![0x36, 0x82]),
            I2cTransaction::read(sgp30::ADDRESS, encode_words(&[0, 0, 1])),
        ]
    }

    fn shtc1_probe() -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(shtc1::ADDRESS, vec![0xef, 0xc8]),
            I2cTransaction::read(shtc1::ADDRESS, encode_words(&[0x0007])),
        ]
    }

    #[test]
    fn test_init() {
        let mut sgp_bus = I2cMock::new(&sgp30_probe_and_init());
        let mut sht_bus = I2cMock::new(&shtc1_probe());
        let mut ess = Ess::new(
            Sgp30::new(sgp_bus.clone(), NoopDelay),
            Shtc1::new(sht_bus.clone(), NoopDelay),
            false,
        );

        ess.init().unwrap();

        sgp_bus.done();
        sht_bus.done();
    }

    #[test]
    fn test_init_with_workaround_ignores_reset_nack() {
        let mut sht_expectations = vec![
            I2cTransaction::write(shtc1::ADDRESS, vec![0x80, 0x5d]).with_error(ErrorKind::Other),
        ];
        sht_expectations.extend(shtc1_probe());

        let mut sgp_bus = I2cMock::new(&sgp30_probe_and_init());
        let mut sht_bus = I2cMock::new(&sht_expectations);
        let mut ess = Ess::new(
            Sgp30::new(sgp_bus.clone(), NoopDelay),
            Shtc1::new(sht_bus.clone(), NoopDelay),
            true,
        );

        ess.init().unwrap();

        sgp_bus.done();
        sht_bus.done();
    }

    #[test]
    fn test_init_fails_when_shtc1_missing() {
        let sgp_expectations = [
            I2cTransaction::write(sgp30::ADDRESS, vec![0x20, 0x2f]),
            I2cTransaction::read(sgp30::ADDRESS, encode_words(&[0x0020])),
        ];
        let sht_expectations = [
            I2cTransaction::write(shtc1::ADDRESS, vec![0xef, 0xc8]).with_error(ErrorKind::Other),
        ];
        let mut sgp_bus = I2cMock::new(&sgp_expectations);
        let mut sht_bus = I2cMock::new(&sht_expectations);
        let mut ess = Ess::new(
            Sgp30::new(sgp_bus.clone(), NoopDelay),
            Shtc1::new(sht_bus.clone(), NoopDelay),
            false,
        );

        assert!(ess.init().is_err());

        sgp_bus.done();
        sht_bus.done();
    }
}
