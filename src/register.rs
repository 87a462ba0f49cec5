//! BMP280 register map.
//!
//! Each register (or fixed-size register block) is represented by a marker
//! type implementing [`Readable`] and/or [`Writable`]. The markers carry the
//! register address and transfer length; encoding and decoding of the packed
//! bit fields lives next to them. Addresses and layouts follow the BMP280
//! datasheet, section 4.

use thiserror::Error;

use crate::calibration::CalibrationData;

/// A register field was read back with a bit pattern the datasheet does not
/// define. Should not happen with a healthy device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("register {register:#04x} holds invalid value {value:#04x} at bit {bit_offset}")]
pub struct InvalidRegisterField {
    pub register: u8,
    pub value: u8,
    pub bit_offset: u8,
}

/// A raw field value outside the range documented for it, rejected before any
/// bus traffic takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value {0:#04x} is out of range for this register field")]
pub struct UnexpectedValue(pub u8);

pub trait Reg {
    const ADDR: u8;
}

pub trait Readable: Reg {
    type Out;
    const N: usize = 1;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField>;
}

pub trait Writable: Reg {
    type In;
    fn encode(v: &Self::In) -> u8;
}

/// Marker struct for the ID (0xD0) register.
///
/// - **Length:** 1 byte
/// - **Access:** Read-only
///
/// Reads back [`crate::CHIP_ID`] (0x58) on a BMP280.
pub struct ChipId;
impl Reg for ChipId {
    const ADDR: u8 = 0xD0;
}

impl Readable for ChipId {
    type Out = u8;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField> {
        Ok(b[0])
    }
}

/// Marker struct for the RESET (0xE0) register.
///
/// - **Length:** 1 byte
/// - **Access:** Write-only
///
/// Writing [`ResetCmd::SoftReset`] (0xB6) restarts the device and reloads its
/// NVM contents; any other value is ignored by the chip.
pub struct Reset;
impl Reg for Reset {
    const ADDR: u8 = 0xE0;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetCmd {
    SoftReset,
}

impl Writable for Reset {
    type In = ResetCmd;
    fn encode(v: &Self::In) -> u8 {
        match v {
            ResetCmd::SoftReset => 0xB6,
        }
    }
}

/// Marker struct for the STATUS (0xF3) register.
///
/// - **Length:** 1 byte
/// - **Access:** Read-only
pub struct Status;
impl Reg for Status {
    const ADDR: u8 = 0xF3;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags {
    /// A conversion is running. Cleared when results have been transferred
    /// to the data registers.
    pub measuring: bool,
    /// NVM data is being copied to image registers. Set briefly after power
    /// on reset and before every conversion.
    pub im_update: bool,
}

impl Readable for Status {
    type Out = StatusFlags;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField> {
        Ok(StatusFlags {
            measuring: (b[0] & 0b0000_1000) != 0,
            im_update: (b[0] & 0b0000_0001) != 0,
        })
    }
}

/// Marker struct for the CTRL_MEAS (0xF4) register.
///
/// - **Length:** 1 byte
/// - **Access:** Read/write
///
/// Packing: `osrs_t[7:5] | osrs_p[4:2] | mode[1:0]`.
pub struct CtrlMeas;
impl Reg for CtrlMeas {
    const ADDR: u8 = 0xF4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CtrlMeasCfg {
    pub osrs_t: Oversampling,
    pub osrs_p: Oversampling,
    pub mode: PowerMode,
}

impl CtrlMeasCfg {
    /// Builds a control configuration from raw field values, rejecting
    /// anything outside the documented bit ranges before it can reach the
    /// bus.
    pub fn from_raw(osrs_t: u8, osrs_p: u8, mode: u8) -> Result<Self, UnexpectedValue> {
        Ok(Self {
            osrs_t: Oversampling::try_from(osrs_t)?,
            osrs_p: Oversampling::try_from(osrs_p)?,
            mode: PowerMode::try_from(mode)?,
        })
    }
}

impl Readable for CtrlMeas {
    type Out = CtrlMeasCfg;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField> {
        Ok(CtrlMeasCfg {
            osrs_t: Oversampling::from_field((b[0] >> 5) & 0b111),
            osrs_p: Oversampling::from_field((b[0] >> 2) & 0b111),
            mode: PowerMode::from_field(b[0] & 0b11),
        })
    }
}

impl Writable for CtrlMeas {
    type In = CtrlMeasCfg;
    fn encode(v: &Self::In) -> u8 {
        let osrs_t: u8 = v.osrs_t.into();
        let osrs_p: u8 = v.osrs_p.into();
        let mode: u8 = v.mode.into();
        (osrs_t << 5) | (osrs_p << 2) | mode
    }
}

/// Marker struct for the CONFIG (0xF5) register.
///
/// - **Length:** 1 byte
/// - **Access:** Read/write
///
/// Packing: `t_sb[7:5] | filter[4:2] | spi3w_en[0]`.
pub struct Config;
impl Reg for Config {
    const ADDR: u8 = 0xF5;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigCfg {
    pub standby_time: StandbyTime,
    pub filter: Filter,
    pub spi3w_en: bool,
}

impl ConfigCfg {
    /// Builds a config-register value from raw field values, rejecting
    /// anything outside the documented bit ranges.
    pub fn from_raw(t_sb: u8, filter: u8, spi3w_en: bool) -> Result<Self, UnexpectedValue> {
        Ok(Self {
            standby_time: StandbyTime::try_from(t_sb)?,
            filter: Filter::try_from(filter)?,
            spi3w_en,
        })
    }
}

impl Readable for Config {
    type Out = ConfigCfg;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField> {
        Ok(ConfigCfg {
            standby_time: StandbyTime::from_field((b[0] >> 5) & 0b111),
            filter: Filter::from_field((b[0] >> 2) & 0b111),
            spi3w_en: (b[0] & 0b1) != 0,
        })
    }
}

impl Writable for Config {
    type In = ConfigCfg;
    fn encode(v: &Self::In) -> u8 {
        let t_sb: u8 = v.standby_time.into();
        let filter: u8 = v.filter.into();
        (t_sb << 5) | (filter << 2) | (v.spi3w_en as u8)
    }
}

/// Marker struct for the PRESS_MSB/LSB/XLSB (0xF7 - 0xF9) registers.
///
/// A 3-byte burst read assembled big-endian into the raw 20-bit ADC code.
/// When pressure oversampling is [`Oversampling::Skip`] the device leaves the
/// bank at its reset pattern and the decoded value is 0x80000; the driver
/// passes that sentinel through untouched.
pub struct PressureData;
impl Reg for PressureData {
    const ADDR: u8 = 0xF7;
}

impl Readable for PressureData {
    type Out = u32;
    const N: usize = 3;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField> {
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]) >> 4)
    }
}

/// Marker struct for the TEMP_MSB/LSB/XLSB (0xFA - 0xFC) registers.
///
/// Same layout and skip sentinel as [`PressureData`].
pub struct TemperatureData;
impl Reg for TemperatureData {
    const ADDR: u8 = 0xFA;
}

impl Readable for TemperatureData {
    type Out = u32;
    const N: usize = 3;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField> {
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]) >> 4)
    }
}

/// Marker struct for the calibration block (0x88 - 0x9F).
///
/// - **Length:** 24 bytes
/// - **Access:** Read-only
///
/// Twelve little-endian 16-bit factory coefficients. `dig_T1` and `dig_P1`
/// are unsigned, everything else is signed two's-complement.
pub struct Calibration;
impl Reg for Calibration {
    const ADDR: u8 = 0x88;
}

impl Readable for Calibration {
    type Out = CalibrationData;
    const N: usize = 24;
    fn decode(b: &[u8]) -> Result<Self::Out, InvalidRegisterField> {
        Ok(CalibrationData {
            dig_t1: u16::from_le_bytes([b[0], b[1]]),
            dig_t2: i16::from_le_bytes([b[2], b[3]]),
            dig_t3: i16::from_le_bytes([b[4], b[5]]),
            dig_p1: u16::from_le_bytes([b[6], b[7]]),
            dig_p2: i16::from_le_bytes([b[8], b[9]]),
            dig_p3: i16::from_le_bytes([b[10], b[11]]),
            dig_p4: i16::from_le_bytes([b[12], b[13]]),
            dig_p5: i16::from_le_bytes([b[14], b[15]]),
            dig_p6: i16::from_le_bytes([b[16], b[17]]),
            dig_p7: i16::from_le_bytes([b[18], b[19]]),
            dig_p8: i16::from_le_bytes([b[20], b[21]]),
            dig_p9: i16::from_le_bytes([b[22], b[23]]),
        })
    }
}

/// Per-channel oversampling for the `osrs_t` and `osrs_p` fields of
/// CTRL_MEAS (0xF4).
///
/// [`Oversampling::Skip`] disables the channel; its data registers keep the
/// 0x80000 reset pattern and, for pressure readings, compensation becomes
/// meaningless because it depends on a valid fine-temperature value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    Skip,
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    /// Decodes a 3-bit register field. 0b110 and 0b111 alias x16 per the
    /// datasheet.
    fn from_field(field: u8) -> Self {
        match field {
            0b000 => Oversampling::Skip,
            0b001 => Oversampling::X1,
            0b010 => Oversampling::X2,
            0b011 => Oversampling::X4,
            0b100 => Oversampling::X8,
            _ => Oversampling::X16,
        }
    }
}

impl TryFrom<u8> for Oversampling {
    type Error = UnexpectedValue;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0b111 {
            return Err(UnexpectedValue(value));
        }
        Ok(Self::from_field(value))
    }
}

impl From<Oversampling> for u8 {
    fn from(v: Oversampling) -> u8 {
        match v {
            Oversampling::Skip => 0b000,
            Oversampling::X1 => 0b001,
            Oversampling::X2 => 0b010,
            Oversampling::X4 => 0b011,
            Oversampling::X8 => 0b100,
            Oversampling::X16 => 0b101,
        }
    }
}

/// The mode field of CTRL_MEAS (0xF4).
///
/// See section 3.6 of the datasheet for the mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// No measurements are performed. Default state after reset.
    Sleep,
    /// A single conversion runs, then the device returns to Sleep on its own.
    Forced,
    /// Continuous conversions, paced by the configured standby time.
    Normal,
}

impl PowerMode {
    fn from_field(field: u8) -> Self {
        match field {
            0b00 => PowerMode::Sleep,
            0b01 | 0b10 => PowerMode::Forced,
            _ => PowerMode::Normal,
        }
    }
}

impl TryFrom<u8> for PowerMode {
    type Error = UnexpectedValue;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0b11 {
            return Err(UnexpectedValue(value));
        }
        Ok(Self::from_field(value))
    }
}

impl From<PowerMode> for u8 {
    fn from(v: PowerMode) -> u8 {
        match v {
            PowerMode::Sleep => 0b00,
            PowerMode::Forced => 0b01,
            PowerMode::Normal => 0b11,
        }
    }
}

/// Standby interval between conversions in Normal mode, the `t_sb` field of
/// CONFIG (0xF5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StandbyTime {
    Ms0p5 = 0b000,
    Ms62p5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms2000 = 0b110,
    Ms4000 = 0b111,
}

impl StandbyTime {
    fn from_field(field: u8) -> Self {
        match field {
            0b000 => StandbyTime::Ms0p5,
            0b001 => StandbyTime::Ms62p5,
            0b010 => StandbyTime::Ms125,
            0b011 => StandbyTime::Ms250,
            0b100 => StandbyTime::Ms500,
            0b101 => StandbyTime::Ms1000,
            0b110 => StandbyTime::Ms2000,
            _ => StandbyTime::Ms4000,
        }
    }
}

impl TryFrom<u8> for StandbyTime {
    type Error = UnexpectedValue;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0b111 {
            return Err(UnexpectedValue(value));
        }
        Ok(Self::from_field(value))
    }
}

impl From<StandbyTime> for u8 {
    fn from(v: StandbyTime) -> u8 {
        v as u8
    }
}

/// IIR filter coefficient, the `filter` field of CONFIG (0xF5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    Off,
    X2,
    X4,
    X8,
    X16,
}

impl Filter {
    /// 0b101 - 0b111 alias x16 per the datasheet.
    fn from_field(field: u8) -> Self {
        match field {
            0b000 => Filter::Off,
            0b001 => Filter::X2,
            0b010 => Filter::X4,
            0b011 => Filter::X8,
            _ => Filter::X16,
        }
    }
}

impl TryFrom<u8> for Filter {
    type Error = UnexpectedValue;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 0b111 {
            return Err(UnexpectedValue(value));
        }
        Ok(Self::from_field(value))
    }
}

impl From<Filter> for u8 {
    fn from(v: Filter) -> u8 {
        match v {
            Filter::Off => 0b000,
            Filter::X2 => 0b001,
            Filter::X4 => 0b010,
            Filter::X8 => 0b011,
            Filter::X16 => 0b100,
        }
    }
}
