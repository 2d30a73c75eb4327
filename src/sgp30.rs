use anyhow::Context;
use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{measurement::IaqReading, sensirion};

pub const ADDRESS: u8 = 0x58;

pub const CMD_IAQ_INIT: u16 = 0x2003;
pub const CMD_MEASURE_IAQ: u16 = 0x2008;
pub const CMD_GET_FEATURE_SET: u16 = 0x202f;
pub const CMD_GET_SERIAL_ID: u16 = 0x3682;

const IAQ_INIT_DURATION_MS: u32 = 10;
const MEASURE_IAQ_DURATION_MS: u32 = 12;
const FEATURE_SET_DURATION_MS: u32 = 10;
const SERIAL_ID_DURATION_MS: u32 = 1;

pub const PRODUCT_TYPE_SGP30: u8 = 0;

#[derive(Debug)]
pub struct Sgp30<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Sgp30<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Returns the raw feature set word; product type in the upper nibble.
    pub fn get_feature_set(&mut self) -> Result<u16, anyhow::Error> {
        let mut words = [0u16; 1];
        self.command_with_response(CMD_GET_FEATURE_SET, FEATURE_SET_DURATION_MS, &mut words)?;
        Ok(words[0])
    }

    pub fn probe(&mut self) -> Result<(), anyhow::Error> {
        let feature_set = self
            .get_feature_set()
            .context("Failed to read SGP30 feature set")?;

        let product_type = (feature_set >> 12) as u8;
        if product_type != PRODUCT_TYPE_SGP30 {
            return Err(anyhow::anyhow!(
                "Unexpected SGP product type {product_type} (feature set {feature_set:#06x})"
            ));
        }

        Ok(())
    }

    pub fn get_serial_id(&mut self) -> Result<u64, anyhow::Error> {
        let mut words = [0u16; 3];
        self.command_with_response(CMD_GET_SERIAL_ID, SERIAL_ID_DURATION_MS, &mut words)?;
        Ok(words
            .iter()
            .fold(0u64, |id, &word| (id << 16) | u64::from(word)))
    }

    /// Starts the on-chip baseline algorithm. Readings are fixed at
    /// 400 ppm / 0 ppb for the first ~15 s afterwards.
    pub fn iaq_init(&mut self) -> Result<(), anyhow::Error> {
        sensirion::write_command(&mut self.i2c, ADDRESS, CMD_IAQ_INIT)?;
        self.delay.delay_ms(IAQ_INIT_DURATION_MS);
        Ok(())
    }

    pub fn measure_iaq(&mut self) -> Result<IaqReading, anyhow::Error> {
        let mut words = [0u16; 2];
        self.command_with_response(CMD_MEASURE_IAQ, MEASURE_IAQ_DURATION_MS, &mut words)?;

        Ok(IaqReading {
            co2_eq_ppm: words[0],
            tvoc_ppb: words[1],
        })
    }

    fn command_with_response(
        &mut self,
        command: u16,
        duration_ms: u32,
        words: &mut [u16],
    ) -> Result<(), anyhow::Error> {
        sensirion::write_command(&mut self.i2c, ADDRESS, command)?;
        self.delay.delay_ms(duration_ms);
        sensirion::read_words(&mut self.i2c, ADDRESS, command, words)
    }
}
