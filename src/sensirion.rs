use std::fmt::Debug;

use embedded_hal::i2c::I2c;
use sensirion_i2c::{crc8, i2c};

/// Two data bytes followed by their CRC-8.
pub const WORD_SIZE: usize = 3;

fn bus_error(operation: &str, address: u8, command: u16, e: impl Debug) -> anyhow::Error {
    anyhow::anyhow!("I2C {operation} for command {command:#06x} at {address:#04x} failed: {e:?}")
}

pub fn write_command<I: I2c>(bus: &mut I, address: u8, command: u16) -> Result<(), anyhow::Error> {
    i2c::write_command_u16(bus, address, command)
        .map_err(|e| bus_error("write", address, command, e))
}

pub fn write_command_with_args<I: I2c>(
    bus: &mut I,
    address: u8,
    command: u16,
    args: &[u16],
) -> Result<(), anyhow::Error> {
    let mut buf = Vec::with_capacity(2 + args.len() * WORD_SIZE);
    buf.extend_from_slice(&command.to_be_bytes());
    buf.extend_from_slice(&encode_words(args));

    bus.write(address, &buf)
        .map_err(|e| bus_error("write", address, command, e))
}

/// Reads `words.len()` CRC-protected words that answer `command`.
pub fn read_words<I: I2c>(
    bus: &mut I,
    address: u8,
    command: u16,
    words: &mut [u16],
) -> Result<(), anyhow::Error> {
    let mut buf = vec![0u8; words.len() * WORD_SIZE];
    i2c::read_words_with_crc(bus, address, &mut buf).map_err(|e| match e {
        i2c::Error::Crc => anyhow::anyhow!(
            "Invalid checksum in response to command {command:#06x} from {address:#04x}"
        ),
        i2c::Error::I2cRead(e) => bus_error("read", address, command, e),
        i2c::Error::I2cWrite(e) => bus_error("write", address, command, e),
    })?;

    for (chunk, word) in buf.chunks_exact(WORD_SIZE).zip(words.iter_mut()) {
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }

    Ok(())
}

pub fn encode_words(words: &[u16]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(words.len() * WORD_SIZE);
    for word in words {
        let bytes = word.to_be_bytes();
        buf.extend_from_slice(&bytes);
        buf.push(crc8::calculate(&bytes));
    }
    buf
}

/// Big-endian IEEE754 float spread over two words.
pub fn words_to_f32(high: u16, low: u16) -> f32 {
    f32::from_bits((u32::from(high) << 16) | u32::from(low))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn test_crc_reference_vector() {
        assert_eq!(crc8::calculate(&[0xbe, 0xef]), 0x92);
        assert_eq!(encode_words(&[0xbeef]), vec![0xbe, 0xef, 0x92]);
    }

    #[test]
    fn test_read_words() {
        let expectations = [I2cTransaction::read(0x58, encode_words(&[0x0102, 0xbeef]))];
        let mut bus = I2cMock::new(&expectations);

        let mut words = [0u16; 2];
        read_words(&mut bus, 0x58, 0x2008, &mut words).unwrap();
        assert_eq!(words, [0x0102, 0xbeef]);

        bus.done();
    }

    #[test]
    fn test_read_words_rejects_bad_checksum() {
        let mut response = encode_words(&[0xbeef]);
        response[2] ^= 0xff;
        let expectations = [I2cTransaction::read(0x58, response)];
        let mut bus = I2cMock::new(&expectations);

        let mut words = [0u16; 1];
        assert!(read_words(&mut bus, 0x58, 0x2008, &mut words).is_err());

        bus.done();
    }

    #[test]
    fn test_write_command_with_args() {
        let expectations = [I2cTransaction::write(0x69, vec![0x00, 0x10, 0x03, 0x00, 0xac])];
        let mut bus = I2cMock::new(&expectations);

        write_command_with_args(&mut bus, 0x69, 0x0010, &[0x0300]).unwrap();

        bus.done();
    }

    #[test]
    fn test_words_to_f32() {
        let bits = 12.5f32.to_bits();
        assert_eq!(words_to_f32((bits >> 16) as u16, bits as u16), 12.5);
    }
}
