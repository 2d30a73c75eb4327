use std::time::Duration;

/// Board wiring, fixed at build time.
#[derive(Debug, Clone, Copy)]
pub struct HardwareConfig {
    pub i2c_bus: u8,
    /// Soft-reset the SHTC1 before probing; some shield revisions power up
    /// with the sensor in an undefined state.
    pub needs_init_workaround: bool,
    pub leds_supported: bool,
}

pub const HARDWARE_CONFIG: HardwareConfig = HardwareConfig {
    i2c_bus: 1,
    needs_init_workaround: false,
    leds_supported: false,
};

/// ESS status LED pins (BCM numbering).
pub const LED_RED_PIN: u8 = 9;
pub const LED_YELLOW_PIN: u8 = 10;
pub const LED_GREEN_PIN: u8 = 11;

pub const PROBE_DELAY: Duration = Duration::from_millis(500);

/// The SGP30 baseline algorithm expects one IAQ read per second.
pub const LOOP_PERIOD: Duration = Duration::from_secs(1);

pub const AUTO_CLEAN_DAYS: u8 = 4;

pub const UPLOAD_ENDPOINT: &str = match option_env!("AIR_QUALITY_ENDPOINT") {
    Some(endpoint) => endpoint,
    None => "http://127.0.0.1:8080/measurements",
};
