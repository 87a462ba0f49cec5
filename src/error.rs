//! Errors that can occur when using the BMP280 device.
//!
//! The error type is generic over the underlying bus error so that transport
//! failures propagate unmodified; the driver never retries and never maps a
//! bus fault onto a plausible sensor reading.

use thiserror::Error;

use crate::register::{InvalidRegisterField, UnexpectedValue};

/// All possible errors that can occur when using the BMP280 driver.
#[derive(Debug, Error)]
pub enum Bmp280Error<BusError> {
    /// An error was reported by the underlying I2C transport (timeout, NACK).
    #[error("bus transfer failed")]
    Bus(BusError),

    /// No BMP280 answered with the expected chip id.
    ///
    /// Could possibly indicate an error with address selection and/or wiring.
    #[error("no BMP280 detected on the bus")]
    NotConnected,

    /// A raw register field value was outside its documented range. Raised
    /// before any transport activity.
    #[error(transparent)]
    InvalidValue(#[from] UnexpectedValue),

    /// A register read returned a bit pattern the datasheet does not define.
    #[error(transparent)]
    UnexpectedRegisterData(InvalidRegisterField),
}
