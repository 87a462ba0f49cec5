//! Platform-agnostic driver for the Bosch BMP280 barometric pressure and
//! temperature sensor, built on the blocking `embedded-hal` 1.0 traits.
//!
//! The driver owns the factory calibration constants and the 64-bit
//! fixed-point compensation pipeline; the physical link is abstracted behind
//! the [`bus::Bus`] trait, with [`bus::I2cBus`] as the stock implementation
//! over an `I2c` + `DelayNs` pair. Every register transaction is a blocking
//! round trip with a fixed settle delay ([`bus::SETTLE_TIME_MS`]), which is
//! what serial bridge chips in front of the sensor require.
//!
//! # Examples
//!
//! ```no_run
//! # use embedded_hal::delay::DelayNs;
//! # use embedded_hal::i2c::I2c;
//! use bmp280_rs::{Bmp280, Configuration, PRIMARY_ADDRESS};
//!
//! # fn demo<I: I2c, D: DelayNs>(i2c: I, delay: D) -> Result<(), bmp280_rs::Bmp280Error<I::Error>> {
//! let mut device = Bmp280::new_i2c(i2c, PRIMARY_ADDRESS, Configuration::default(), delay)?;
//!
//! device.normal()?;
//! let measurement = device.read_measurement()?;
//! // measurement.temperature in degrees C, measurement.pressure in Pa
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod calibration;
pub mod config;
pub mod error;
pub mod register;

#[cfg(test)]
pub(crate) mod testing;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};
use log::{debug, trace};

use crate::bus::{Bus, I2cBus};
use crate::calibration::CalibrationData;
pub use crate::config::Configuration;
pub use crate::error::Bmp280Error;
use crate::register::{
    ConfigCfg, CtrlMeasCfg, PowerMode, ResetCmd, StatusFlags,
};

/// Value of the ID (0xD0) register on a BMP280.
pub const CHIP_ID: u8 = 0x58;

/// Device I2C address with the SDO pin pulled low.
pub const PRIMARY_ADDRESS: SevenBitAddress = 0x76;

/// Device I2C address with the SDO pin pulled high.
pub const SECONDARY_ADDRESS: SevenBitAddress = 0x77;

/// Wait after a soft reset while the device reloads its NVM contents. An
/// order of magnitude longer than the register settle delay; must not be
/// shortened.
pub const RESET_STARTUP_MS: u32 = 1000;

/// Type alias used to simplify return types throughout the driver.
pub type Bmp280Result<T, BusError> = Result<T, Bmp280Error<BusError>>;

/// Main BMP280 driver struct.
///
/// Holds the calibration constants read at construction time and a [`Bus`]
/// for register access. All methods take `&mut self`; a caller that needs
/// concurrent access to one physical sensor must serialize externally.
pub struct Bmp280<B> {
    bus: B,
    calibration: CalibrationData,
}

impl<I2C, D> Bmp280<I2cBus<I2C, D>>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Constructs a driver instance over a blocking I2C peripheral.
    ///
    /// This probes for the chip, performs a soft reset, loads the factory
    /// calibration block and applies `config`. See [`PRIMARY_ADDRESS`] /
    /// [`SECONDARY_ADDRESS`] for the address argument.
    pub fn new_i2c(
        i2c: I2C,
        address: SevenBitAddress,
        config: Configuration,
        delay: D,
    ) -> Bmp280Result<Self, I2C::Error> {
        Self::new(I2cBus::new(i2c, address, delay), config)
    }
}

impl<B> Bmp280<B>
where
    B: Bus,
{
    /// Probes if the device is ready by attempting to read the chip id
    /// `attempts` times with a 1 ms delay.
    ///
    /// Returns [`Bmp280Error::NotConnected`] if no matching id is read.
    fn probe_ready(bus: &mut B, attempts: u32) -> Bmp280Result<(), B::Error> {
        for _ in 0..attempts {
            if let Ok(id) = bus.read::<register::ChipId>() {
                if id == CHIP_ID {
                    return Ok(());
                }
            }

            bus.wait_ms(1);
        }

        Err(Bmp280Error::NotConnected)
    }

    /// Creates a new driver instance over an already-constructed [`Bus`].
    pub fn new(mut bus: B, config: Configuration) -> Bmp280Result<Self, B::Error> {
        Self::probe_ready(&mut bus, 5)?;

        bus.write::<register::Reset>(&ResetCmd::SoftReset)?;
        bus.wait_ms(RESET_STARTUP_MS);
        debug!("BMP280 reset, NVM reloaded");

        let calibration = CalibrationData::new(&mut bus)?;
        debug!("calibration coefficients loaded");

        let mut device = Bmp280 { bus, calibration };
        device.apply_configuration(&config)?;

        Ok(device)
    }

    /// Writes the CONFIG and CTRL_MEAS registers from `config`.
    pub fn apply_configuration(&mut self, config: &Configuration) -> Bmp280Result<(), B::Error> {
        self.bus.write::<register::Config>(&config.config_reg())?;
        self.bus.write::<register::CtrlMeas>(&config.ctrl_meas())?;

        Ok(())
    }

    /// Reads the ID (0xD0) register.
    pub fn chip_id(&mut self) -> Bmp280Result<u8, B::Error> {
        self.bus.read::<register::ChipId>()
    }

    /// Determines if a BMP280 is connected by reading the chip id.
    pub fn is_connected(&mut self) -> Bmp280Result<bool, B::Error> {
        Ok(self.chip_id()? == CHIP_ID)
    }

    /// Triggers a soft reset and blocks for [`RESET_STARTUP_MS`].
    ///
    /// All user settings revert to their power-on defaults, not to the
    /// configuration that was applied at construction time.
    pub fn soft_reset(&mut self) -> Bmp280Result<(), B::Error> {
        self.bus.write::<register::Reset>(&ResetCmd::SoftReset)?;
        self.bus.wait_ms(RESET_STARTUP_MS);

        Ok(())
    }

    /// Reads the STATUS (0xF3) register. Each call is a fresh bus round
    /// trip; nothing is cached.
    pub fn status(&mut self) -> Bmp280Result<StatusFlags, B::Error> {
        self.bus.read::<register::Status>()
    }

    /// Reads the CTRL_MEAS (0xF4) register.
    pub fn control(&mut self) -> Bmp280Result<CtrlMeasCfg, B::Error> {
        self.bus.read::<register::CtrlMeas>()
    }

    /// Writes oversampling and mode to the CTRL_MEAS (0xF4) register.
    pub fn set_control(&mut self, cfg: CtrlMeasCfg) -> Bmp280Result<(), B::Error> {
        self.bus.write::<register::CtrlMeas>(&cfg)
    }

    /// Reads the CONFIG (0xF5) register.
    pub fn config(&mut self) -> Bmp280Result<ConfigCfg, B::Error> {
        self.bus.read::<register::Config>()
    }

    /// Writes standby time, filter and SPI mode to the CONFIG (0xF5)
    /// register.
    pub fn set_config(&mut self, cfg: ConfigCfg) -> Bmp280Result<(), B::Error> {
        self.bus.write::<register::Config>(&cfg)
    }

    /// Sets the mode field of CTRL_MEAS, preserving the current oversampling
    /// settings through a read-modify-write.
    ///
    /// Valid transitions are Sleep <-> Normal and Sleep -> Forced; Forced
    /// reverts to Sleep inside the device once its single conversion
    /// completes, without the driver observing the transition.
    pub fn set_mode(&mut self, mode: PowerMode) -> Bmp280Result<(), B::Error> {
        let mut ctrl = self.bus.read::<register::CtrlMeas>()?;
        ctrl.mode = mode;
        self.bus.write::<register::CtrlMeas>(&ctrl)?;

        Ok(())
    }

    /// Reads the current mode from CTRL_MEAS.
    pub fn mode(&mut self) -> Bmp280Result<PowerMode, B::Error> {
        Ok(self.bus.read::<register::CtrlMeas>()?.mode)
    }

    /// Transitions to Sleep mode.
    pub fn sleep(&mut self) -> Bmp280Result<(), B::Error> {
        self.set_mode(PowerMode::Sleep)
    }

    /// Triggers a single one-shot conversion (Forced mode).
    pub fn force_measurement(&mut self) -> Bmp280Result<(), B::Error> {
        self.set_mode(PowerMode::Forced)
    }

    /// Transitions to Normal (continuous) mode.
    pub fn normal(&mut self) -> Bmp280Result<(), B::Error> {
        self.set_mode(PowerMode::Normal)
    }

    /// Reads the raw 20-bit temperature ADC code.
    ///
    /// Reads 0x80000 when temperature oversampling is
    /// [`register::Oversampling::Skip`]; the sentinel is returned as-is.
    pub fn read_raw_temperature(&mut self) -> Bmp280Result<u32, B::Error> {
        self.bus.read::<register::TemperatureData>()
    }

    /// Reads the raw 20-bit pressure ADC code.
    ///
    /// Reads 0x80000 when pressure oversampling is
    /// [`register::Oversampling::Skip`]; the sentinel is returned as-is.
    pub fn read_raw_pressure(&mut self) -> Bmp280Result<u32, B::Error> {
        self.bus.read::<register::PressureData>()
    }

    /// Reads and compensates one temperature/pressure sample.
    ///
    /// The ordering is load-bearing: raw temperature is read and compensated
    /// first, and the resulting fine-temperature value feeds the pressure
    /// compensation of the same sample. A pressure of exactly 0.0 Pa is the
    /// degenerate-compensation sentinel (uncalibrated part), not a physical
    /// reading.
    pub fn read_measurement(&mut self) -> Bmp280Result<Measurement, B::Error> {
        let raw_temp = self.bus.read::<register::TemperatureData>()?;
        let (centi_celsius, t_fine) = self.calibration.compensate_temperature(raw_temp);

        let raw_press = self.bus.read::<register::PressureData>()?;
        let pressure = match self.calibration.compensate_pressure(raw_press, t_fine) {
            Some(q8) => q8 as f32 / 256.0,
            None => 0.0,
        };
        trace!("raw sample t={raw_temp:#07x} p={raw_press:#07x}");

        Ok(Measurement {
            temperature: centi_celsius as f32 / 100.0,
            pressure,
        })
    }

    /// The calibration constants read at construction time.
    pub fn calibration(&self) -> &CalibrationData {
        &self.calibration
    }
}

/// One compensated sample.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature in degrees Celsius, 0.01 degree resolution.
    pub temperature: f32,
    /// Pressure in Pascal. Exactly 0.0 signals degenerate compensation.
    pub pressure: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{Oversampling, PressureData, Status, TemperatureData};
    use crate::testing::FakeBus;

    /// LE encoding of the datasheet example coefficient set.
    const CALIB_BLOCK: [u8; 24] = [
        0x70, 0x6B, // dig_T1 = 27504
        0x43, 0x67, // dig_T2 = 26435
        0x18, 0xFC, // dig_T3 = -1000
        0x7D, 0x8E, // dig_P1 = 36477
        0x43, 0xD6, // dig_P2 = -10685
        0xD0, 0x0B, // dig_P3 = 3024
        0x27, 0x0B, // dig_P4 = 2855
        0x8C, 0x00, // dig_P5 = 140
        0xF9, 0xFF, // dig_P6 = -7
        0x8C, 0x3C, // dig_P7 = 15500
        0xF8, 0xC6, // dig_P8 = -14600
        0x70, 0x17, // dig_P9 = 6000
    ];

    fn connected_bus() -> FakeBus {
        let mut bus = FakeBus::new();
        bus.with_response::<register::ChipId>(&[CHIP_ID]);
        bus.with_response::<register::Calibration>(&CALIB_BLOCK);
        bus
    }

    #[test]
    fn initialize_resets_and_applies_quiescent_defaults() {
        let bus = connected_bus();

        let device = Bmp280::new(bus, Configuration::default()).unwrap();

        let bus = device.bus;
        assert_eq!(Some(0xB6), bus.last_write(0xE0));
        assert!(bus.waited_ms >= RESET_STARTUP_MS);
        // standby 0.5ms, filter off, 4-wire SPI
        assert_eq!(Some(0x00), bus.last_write(0xF5));
        // osrs_t x1, osrs_p x1, Sleep
        assert_eq!(Some(0b001_001_00), bus.last_write(0xF4));
    }

    #[test]
    fn wrong_chip_id_reports_not_connected() {
        let mut bus = FakeBus::new();
        bus.with_response::<register::ChipId>(&[0x60]);

        let result = Bmp280::new(bus, Configuration::default());
        assert!(matches!(result, Err(Bmp280Error::NotConnected)));
    }

    #[test]
    fn measurement_matches_datasheet_example() {
        let mut bus = connected_bus();
        bus.with_response::<TemperatureData>(&[0x7E, 0xED, 0x00]); // 519888
        bus.with_response::<PressureData>(&[0x65, 0x5A, 0xC0]); // 415148

        let mut device = Bmp280::new(bus, Configuration::default()).unwrap();
        let m = device.read_measurement().unwrap();

        assert!((m.temperature - 25.08).abs() < 0.001);
        assert!((m.pressure - 100_653.25).abs() < 0.01);
    }

    #[test]
    fn degenerate_calibration_yields_zero_pascal() {
        let mut bus = FakeBus::new();
        bus.with_response::<register::ChipId>(&[CHIP_ID]);
        bus.with_response::<register::Calibration>(&[0u8; 24]);
        bus.with_response::<TemperatureData>(&[0x7E, 0xED, 0x00]);
        bus.with_response::<PressureData>(&[0x65, 0x5A, 0xC0]);

        let mut device = Bmp280::new(bus, Configuration::default()).unwrap();
        let m = device.read_measurement().unwrap();

        assert_eq!(0.0, m.pressure);
    }

    #[test]
    fn mode_change_preserves_oversampling() {
        let mut bus = connected_bus();
        // Device state: x4/x4, Sleep.
        bus.with_response::<register::CtrlMeas>(&[0b011_011_00]);

        let mut device = Bmp280::new(bus, Configuration::default()).unwrap();
        device.normal().unwrap();

        assert_eq!(Some(0b011_011_11), device.bus.last_write(0xF4));

        device.force_measurement().unwrap();
        assert_eq!(Some(0b011_011_01), device.bus.last_write(0xF4));

        device.sleep().unwrap();
        assert_eq!(Some(0b011_011_00), device.bus.last_write(0xF4));
    }

    #[test]
    fn skipped_channel_raw_read_returns_sentinel() {
        let mut bus = connected_bus();
        bus.with_response::<PressureData>(&[0x80, 0x00, 0x00]);

        let mut device = Bmp280::new(
            bus,
            Configuration::default().pressure_oversampling(Oversampling::Skip),
        )
        .unwrap();

        assert_eq!(0x80000, device.read_raw_pressure().unwrap());
    }

    #[test]
    fn status_reads_are_uncached_round_trips() {
        let mut bus = connected_bus();
        bus.with_response::<Status>(&[0b0000_1001]);

        let mut device = Bmp280::new(bus, Configuration::default()).unwrap();

        let status = device.status().unwrap();
        assert!(status.measuring);
        assert!(status.im_update);
    }

    #[test]
    fn transport_failure_propagates() {
        let mut bus = connected_bus();
        bus.with_failing_read::<Status>();

        let mut device = Bmp280::new(bus, Configuration::default()).unwrap();

        assert!(matches!(device.status(), Err(Bmp280Error::Bus(()))));
    }
}
