//! Initial device configuration applied when the driver is constructed.

use crate::register::{ConfigCfg, CtrlMeasCfg, Filter, Oversampling, PowerMode, StandbyTime};

/// Sampling configuration written during [`crate::Bmp280`] construction.
///
/// The default is the quiescent state the driver guarantees after
/// initialization: x1 oversampling on both channels, shortest standby, IIR
/// filter off, 4-wire SPI, mode Sleep. Builder methods adjust individual
/// fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) mode: PowerMode,
    pub(crate) temperature_oversampling: Oversampling,
    pub(crate) pressure_oversampling: Oversampling,
    pub(crate) standby_time: StandbyTime,
    pub(crate) filter: Filter,
    pub(crate) spi3w_en: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mode: PowerMode::Sleep,
            temperature_oversampling: Oversampling::X1,
            pressure_oversampling: Oversampling::X1,
            standby_time: StandbyTime::Ms0p5,
            filter: Filter::Off,
            spi3w_en: false,
        }
    }
}

impl Configuration {
    pub fn power_mode(mut self, mode: PowerMode) -> Self {
        self.mode = mode;

        self
    }

    /// Oversampling for the temperature channel.
    ///
    /// [`Oversampling::Skip`] leaves the temperature data registers at their
    /// reset pattern, which also invalidates pressure compensation.
    pub fn temperature_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.temperature_oversampling = oversampling;

        self
    }

    pub fn pressure_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.pressure_oversampling = oversampling;

        self
    }

    /// Standby interval between conversions in Normal mode.
    pub fn standby_time(mut self, standby_time: StandbyTime) -> Self {
        self.standby_time = standby_time;

        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;

        self
    }

    /// Enables the 3-wire SPI interface. Leave off for I2C operation.
    pub fn spi3w(mut self, enable: bool) -> Self {
        self.spi3w_en = enable;

        self
    }

    pub(crate) fn ctrl_meas(&self) -> CtrlMeasCfg {
        CtrlMeasCfg {
            osrs_t: self.temperature_oversampling,
            osrs_p: self.pressure_oversampling,
            mode: self.mode,
        }
    }

    pub(crate) fn config_reg(&self) -> ConfigCfg {
        ConfigCfg {
            standby_time: self.standby_time,
            filter: self.filter,
            spi3w_en: self.spi3w_en,
        }
    }
}
