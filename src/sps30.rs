use anyhow::Context;
use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{measurement::PmReading, sensirion};

pub const ADDRESS: u8 = 0x69;

pub const CMD_START_MEASUREMENT: u16 = 0x0010;
pub const CMD_STOP_MEASUREMENT: u16 = 0x0104;
pub const CMD_READ_DATA_READY: u16 = 0x0202;
pub const CMD_READ_MEASUREMENT: u16 = 0x0300;
pub const CMD_AUTO_CLEANING_INTERVAL: u16 = 0x8004;
pub const CMD_READ_SERIAL_NUMBER: u16 = 0xd033;
pub const CMD_READ_FIRMWARE_VERSION: u16 = 0xd100;

/// Measurement output as big-endian IEEE754 floats.
const OUTPUT_FORMAT_FLOAT: u16 = 0x0300;

const COMMAND_DURATION_MS: u32 = 20;
const SERIAL_NUMBER_WORDS: usize = 16;
const MEASUREMENT_WORDS: usize = 20;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

#[derive(Debug)]
pub struct Sps30<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Sps30<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Checks that a sensor answers on the bus and reports what it is.
    pub fn probe(&mut self) -> Result<(), anyhow::Error> {
        let serial = self
            .read_serial_number()
            .context("Failed to read SPS30 serial number")?;
        let (major, minor) = self
            .read_firmware_version()
            .context("Failed to read SPS30 firmware version")?;

        log::info!("SPS30 serial {serial}, firmware {major}.{minor}");
        Ok(())
    }

    pub fn read_serial_number(&mut self) -> Result<String, anyhow::Error> {
        let mut words = [0u16; SERIAL_NUMBER_WORDS];
        self.command_with_response(CMD_READ_SERIAL_NUMBER, &mut words)?;

        let bytes: Vec<u8> = words
            .iter()
            .flat_map(|word| word.to_be_bytes())
            .take_while(|&byte| byte != 0)
            .collect();

        String::from_utf8(bytes).context("Serial number is not valid ASCII")
    }

    pub fn read_firmware_version(&mut self) -> Result<(u8, u8), anyhow::Error> {
        let mut words = [0u16; 1];
        self.command_with_response(CMD_READ_FIRMWARE_VERSION, &mut words)?;
        let [major, minor] = words[0].to_be_bytes();
        Ok((major, minor))
    }

    pub fn set_fan_auto_cleaning_interval(&mut self, seconds: u32) -> Result<(), anyhow::Error> {
        let args = [(seconds >> 16) as u16, seconds as u16];
        sensirion::write_command_with_args(
            &mut self.i2c,
            ADDRESS,
            CMD_AUTO_CLEANING_INTERVAL,
            &args,
        )?;
        self.delay.delay_ms(COMMAND_DURATION_MS);
        Ok(())
    }

    pub fn set_fan_auto_cleaning_interval_days(&mut self, days: u8) -> Result<(), anyhow::Error> {
        self.set_fan_auto_cleaning_interval(u32::from(days) * SECONDS_PER_DAY)
    }

    pub fn start_measurement(&mut self) -> Result<(), anyhow::Error> {
        sensirion::write_command_with_args(
            &mut self.i2c,
            ADDRESS,
            CMD_START_MEASUREMENT,
            &[OUTPUT_FORMAT_FLOAT],
        )?;
        self.delay.delay_ms(COMMAND_DURATION_MS);
        Ok(())
    }

    pub fn stop_measurement(&mut self) -> Result<(), anyhow::Error> {
        sensirion::write_command(&mut self.i2c, ADDRESS, CMD_STOP_MEASUREMENT)?;
        self.delay.delay_ms(COMMAND_DURATION_MS);
        Ok(())
    }

    pub fn read_data_ready(&mut self) -> Result<bool, anyhow::Error> {
        let mut words = [0u16; 1];
        self.command_with_response(CMD_READ_DATA_READY, &mut words)?;
        Ok(words[0] != 0)
    }

    pub fn read_measurement(&mut self) -> Result<PmReading, anyhow::Error> {
        let mut words = [0u16; MEASUREMENT_WORDS];
        self.command_with_response(CMD_READ_MEASUREMENT, &mut words)?;

        let mut values = [0f32; MEASUREMENT_WORDS / 2];
        for (value, pair) in values.iter_mut().zip(words.chunks_exact(2)) {
            *value = sensirion::words_to_f32(pair[0], pair[1]);
        }

        Ok(PmReading::from_array(values))
    }

    fn command_with_response(&mut self, command: u16, words: &mut [u16]) -> Result<(), anyhow::Error> {
        sensirion::write_command(&mut self.i2c, ADDRESS, command)?;
        sensirion::read_words(&mut self.i2c, ADDRESS, command, words)
    }
}
