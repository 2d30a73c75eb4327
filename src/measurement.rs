use std::fmt;

use chrono::{DateTime, Local};

/// SGP30 indoor air quality values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IaqReading {
    pub tvoc_ppb: u16,
    pub co2_eq_ppm: u16,
}

impl fmt::Display for IaqReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tVOC {:4} | CO2eq {:4}", self.tvoc_ppb, self.co2_eq_ppm)
    }
}

/// SHTC1 values, fixed-point scaled by 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateReading {
    pub temperature_milli_celsius: i32,
    pub humidity_milli_percent: i32,
}

impl ClimateReading {
    pub fn temperature(&self) -> f32 {
        self.temperature_milli_celsius as f32 / 1000.0
    }

    pub fn humidity(&self) -> f32 {
        self.humidity_milli_percent as f32 / 1000.0
    }
}

impl fmt::Display for ClimateReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T   {:.2} | RH   {:.2}",
            self.temperature(),
            self.humidity()
        )
    }
}

/// SPS30 values. Mass concentrations in µg/m³, number concentrations in #/cm³,
/// typical particle size in µm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PmReading {
    pub mc_1p0: f32,
    pub mc_2p5: f32,
    pub mc_4p0: f32,
    pub mc_10p0: f32,
    pub nc_0p5: f32,
    pub nc_1p0: f32,
    pub nc_2p5: f32,
    pub nc_4p0: f32,
    pub nc_10p0: f32,
    pub typical_particle_size: f32,
}

/// Mass concentration per size band, derived from the cumulative SPS30 bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassBands {
    pub pm1p0: f32,
    pub pm1p0_2p5: f32,
    pub pm2p5_4p0: f32,
    pub pm4p0_10p0: f32,
}

impl PmReading {
    pub fn from_array(values: [f32; 10]) -> Self {
        let [
            mc_1p0,
            mc_2p5,
            mc_4p0,
            mc_10p0,
            nc_0p5,
            nc_1p0,
            nc_2p5,
            nc_4p0,
            nc_10p0,
            typical_particle_size,
        ] = values;

        Self {
            mc_1p0,
            mc_2p5,
            mc_4p0,
            mc_10p0,
            nc_0p5,
            nc_1p0,
            nc_2p5,
            nc_4p0,
            nc_10p0,
            typical_particle_size,
        }
    }

    pub fn mass_bands(&self) -> MassBands {
        MassBands {
            pm1p0: self.mc_1p0,
            pm1p0_2p5: self.mc_2p5 - self.mc_1p0,
            pm2p5_4p0: self.mc_4p0 - self.mc_2p5,
            pm4p0_10p0: self.mc_10p0 - self.mc_4p0,
        }
    }
}

impl fmt::Display for PmReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "measured values:")?;
        writeln!(f, "\t{:.2} pm1.0", self.mc_1p0)?;
        writeln!(f, "\t{:.2} pm2.5", self.mc_2p5)?;
        writeln!(f, "\t{:.2} pm4.0", self.mc_4p0)?;
        writeln!(f, "\t{:.2} pm10.0", self.mc_10p0)?;
        writeln!(f, "\t{:.2} nc0.5", self.nc_0p5)?;
        writeln!(f, "\t{:.2} nc1.0", self.nc_1p0)?;
        writeln!(f, "\t{:.2} nc2.5", self.nc_2p5)?;
        writeln!(f, "\t{:.2} nc4.0", self.nc_4p0)?;
        writeln!(f, "\t{:.2} nc10.0", self.nc_10p0)?;
        write!(f, "\t{:.2} typical particle size", self.typical_particle_size)
    }
}

/// Everything sampled in one loop iteration. A field is only set when its
/// read succeeded during this iteration.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub timestamp: DateTime<Local>,
    pub iaq: Option<IaqReading>,
    pub climate: Option<ClimateReading>,
    pub particulate: Option<PmReading>,
}

impl Default for Measurement {
    fn default() -> Self {
        Self {
            timestamp: Local::now(),
            iaq: None,
            climate: None,
            particulate: None,
        }
    }
}

impl Measurement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.iaq.is_none() && self.climate.is_none() && self.particulate.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pm(mc: [f32; 4]) -> PmReading {
        PmReading {
            mc_1p0: mc[0],
            mc_2p5: mc[1],
            mc_4p0: mc[2],
            mc_10p0: mc[3],
            ..Default::default()
        }
    }

    #[test]
    fn test_mass_bands_are_bin_differences() {
        let bands = pm([1.5, 4.0, 4.25, 10.25]).mass_bands();
        assert_eq!(bands.pm1p0, 1.5);
        assert_eq!(bands.pm1p0_2p5, 2.5);
        assert_eq!(bands.pm2p5_4p0, 0.25);
        assert_eq!(bands.pm4p0_10p0, 6.0);
    }

    #[test]
    fn test_mass_bands_non_negative_for_monotonic_bins() {
        let samples = [
            [0.0, 0.0, 0.0, 0.0],
            [3.0, 3.0, 3.0, 3.0],
            [0.1, 7.9, 12.0, 12.5],
            [10.0, 20.0, 30.0, 1000.0],
        ];
        for mc in samples {
            let bands = pm(mc).mass_bands();
            assert!(bands.pm1p0 >= 0.0);
            assert!(bands.pm1p0_2p5 >= 0.0);
            assert!(bands.pm2p5_4p0 >= 0.0);
            assert!(bands.pm4p0_10p0 >= 0.0);
        }
    }

    #[test]
    fn test_from_array_keeps_field_order() {
        let reading = PmReading::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 0.5]);
        assert_eq!(reading.mc_1p0, 1.0);
        assert_eq!(reading.mc_10p0, 4.0);
        assert_eq!(reading.nc_0p5, 5.0);
        assert_eq!(reading.nc_10p0, 9.0);
        assert_eq!(reading.typical_particle_size, 0.5);
    }

    #[test]
    fn test_console_lines() {
        let iaq = IaqReading {
            tvoc_ppb: 12,
            co2_eq_ppm: 400,
        };
        assert_eq!(iaq.to_string(), "tVOC   12 | CO2eq  400");

        let climate = ClimateReading {
            temperature_milli_celsius: 23_456,
            humidity_milli_percent: 41_200,
        };
        assert_eq!(climate.to_string(), "T   23.46 | RH   41.20");
    }

    #[test]
    fn test_empty_measurement() {
        let mut measurement = Measurement::new();
        assert!(measurement.is_empty());
        measurement.particulate = Some(PmReading::default());
        assert!(!measurement.is_empty());
    }

    #[test]
    fn test_default_measurement_is_empty() {
        assert!(Measurement::default().is_empty());
    }
}
