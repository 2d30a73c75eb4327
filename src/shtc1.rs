use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{measurement::ClimateReading, sensirion};

pub const ADDRESS: u8 = 0x70;

pub const CMD_READ_ID: u16 = 0xefc8;
/// Normal mode, temperature first, no clock stretching.
pub const CMD_MEASURE: u16 = 0x7866;
pub const CMD_SOFT_RESET: u16 = 0x805d;

pub const ID_MASK: u16 = 0x083f;
pub const ID_SHTC: u16 = 0x0007;

const MEASURE_DURATION_MS: u32 = 15;
const RESET_DURATION_MS: u32 = 1;

#[derive(Debug)]
pub struct Shtc1<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Shtc1<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    pub fn read_id(&mut self) -> Result<u16, anyhow::Error> {
        sensirion::write_command(&mut self.i2c, ADDRESS, CMD_READ_ID)?;
        let mut words = [0u16; 1];
        sensirion::read_words(&mut self.i2c, ADDRESS, CMD_READ_ID, &mut words)?;
        Ok(words[0])
    }

    pub fn probe(&mut self) -> Result<(), anyhow::Error> {
        let id = self.read_id()?;
        if id & ID_MASK != ID_SHTC {
            return Err(anyhow::anyhow!("Unexpected SHTC1 id {id:#06x}"));
        }
        Ok(())
    }

    pub fn soft_reset(&mut self) -> Result<(), anyhow::Error> {
        sensirion::write_command(&mut self.i2c, ADDRESS, CMD_SOFT_RESET)?;
        self.delay.delay_ms(RESET_DURATION_MS);
        Ok(())
    }

    pub fn measure(&mut self) -> Result<ClimateReading, anyhow::Error> {
        sensirion::write_command(&mut self.i2c, ADDRESS, CMD_MEASURE)?;
        self.delay.delay_ms(MEASURE_DURATION_MS);

        let mut words = [0u16; 2];
        sensirion::read_words(&mut self.i2c, ADDRESS, CMD_MEASURE, &mut words)?;

        Ok(ClimateReading {
            temperature_milli_celsius: convert_temperature(words[0]),
            humidity_milli_percent: convert_humidity(words[1]),
        })
    }
}

/// T = -45 + 175 * raw / 2^16, in m°C.
pub fn convert_temperature(raw: u16) -> i32 {
    ((21875 * i32::from(raw)) >> 13) - 45000
}

/// RH = 100 * raw / 2^16, in m%.
pub fn convert_humidity(raw: u16) -> i32 {
    (12500 * i32::from(raw)) >> 13
}
