//! Factory calibration and the fixed-point compensation pipeline.
//!
//! The BMP280 stores twelve trimming coefficients in NVM; raw 20-bit ADC
//! codes are only meaningful after running them through the compensation
//! formulas of datasheet section 3.11.3. The formulas are reproduced here
//! operation for operation in signed 64-bit arithmetic: intermediate products
//! exceed 32 bits, and the exact shift and truncating-division behaviour is
//! what makes the output bit-exact against the reference implementation.

use crate::bus::Bus;
use crate::error::Bmp280Error;
use crate::register;

/// High-resolution temperature intermediate linking the two compensation
/// stages.
///
/// Produced by [`CalibrationData::compensate_temperature`] and consumed (by
/// value) by [`CalibrationData::compensate_pressure`]. Pressure compensation
/// is only correct when fed the fine temperature of the *same* sampling
/// instant; passing it by value rather than caching it in the driver keeps a
/// stale reading from being paired with a fresh pressure code silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FineTemp(pub(crate) i64);

impl FineTemp {
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// The twelve factory trimming coefficients, read once per session from the
/// 24-byte block at 0x88.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationData {
    pub(crate) dig_t1: u16,
    pub(crate) dig_t2: i16,
    pub(crate) dig_t3: i16,
    pub(crate) dig_p1: u16,
    pub(crate) dig_p2: i16,
    pub(crate) dig_p3: i16,
    pub(crate) dig_p4: i16,
    pub(crate) dig_p5: i16,
    pub(crate) dig_p6: i16,
    pub(crate) dig_p7: i16,
    pub(crate) dig_p8: i16,
    pub(crate) dig_p9: i16,
}

impl CalibrationData {
    /// Reads the coefficient block from the device in a single burst.
    pub fn new<B: Bus>(bus: &mut B) -> Result<Self, Bmp280Error<B::Error>> {
        bus.read::<register::Calibration>()
    }

    /// Compensates a raw 20-bit temperature code.
    ///
    /// Returns the temperature in hundredths of a degree Celsius together
    /// with the [`FineTemp`] value to feed into
    /// [`compensate_pressure`](Self::compensate_pressure) for the same
    /// sample. Pure function of the inputs; resolution is 0.01 degrees.
    pub fn compensate_temperature(&self, raw_temp: u32) -> (i32, FineTemp) {
        let raw = raw_temp as i64;
        let t1 = self.dig_t1 as i64;
        let t2 = self.dig_t2 as i64;
        let t3 = self.dig_t3 as i64;

        let var1 = (((raw >> 3) - (t1 << 1)) * t2) >> 11;
        let var2 = (((((raw >> 4) - t1) * ((raw >> 4) - t1)) >> 12) * t3) >> 14;
        let t_fine = var1 + var2;
        let centi_celsius = ((t_fine * 5 + 128) >> 8) as i32;

        (centi_celsius, FineTemp(t_fine))
    }

    /// Compensates a raw 20-bit pressure code against the fine temperature
    /// of the same sampling instant.
    ///
    /// Returns the pressure in Q24.8 fixed point (divide by 256 for Pa), or
    /// `None` when the denominator resolves to zero. The zero denominator is
    /// the device-documented degenerate case (uncalibrated part, cold-start
    /// fine temperature); the datasheet output for it is 0 Pa, which callers
    /// reconstruct from the `None`.
    pub fn compensate_pressure(&self, raw_press: u32, t_fine: FineTemp) -> Option<u32> {
        let p1 = self.dig_p1 as i64;
        let p2 = self.dig_p2 as i64;
        let p3 = self.dig_p3 as i64;
        let p4 = self.dig_p4 as i64;
        let p5 = self.dig_p5 as i64;
        let p6 = self.dig_p6 as i64;
        let p7 = self.dig_p7 as i64;
        let p8 = self.dig_p8 as i64;
        let p9 = self.dig_p9 as i64;

        let mut var1 = t_fine.0 - 128000;
        let mut var2 = var1 * var1 * p6;
        var2 += (var1 * p5) << 17;
        var2 += p4 << 35;
        var1 = ((var1 * var1 * p3) >> 8) + ((var1 * p2) << 12);
        var1 = (((1i64 << 47) + var1) * p1) >> 33;

        if var1 == 0 {
            return None;
        }

        let mut p = 1_048_576 - raw_press as i64;
        // i64 division truncates toward zero, matching the reference.
        p = (((p << 31) - var2) * 3125) / var1;
        let var1 = (p9 * (p >> 13) * (p >> 13)) >> 25;
        let var2 = (p8 * p) >> 19;
        p = ((p + var1 + var2) >> 8) + (p7 << 4);

        Some(p as u32)
    }
}
