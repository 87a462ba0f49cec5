//! Transport seam between the driver and the physical link.
//!
//! The [`Bus`] trait is the only thing the driver talks to. [`I2cBus`] is the
//! production implementation on top of the blocking `embedded-hal` I2C and
//! delay traits; tests substitute a fake with canned register contents and
//! zero delays.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::error::Bmp280Error;
use crate::register::{Readable, Writable};

/// Largest register block transferred in one burst (the calibration area).
pub const MAX_REG_BYTES: usize = 24;

/// Minimum wait between the register-pointer write and the subsequent read,
/// and after every register write. This is a timing contract of the serial
/// bridge, not of the sensor itself.
pub const SETTLE_TIME_MS: u32 = 10;

/// Typed register access over some physical link.
///
/// `read` and `write` move whole registers (or register blocks) using the
/// marker types from [`crate::register`]; `wait_ms` is the hook the driver
/// uses for device-mandated waits such as the post-reset NVM reload.
pub trait Bus {
    type Error;

    fn read<R: Readable>(&mut self) -> Result<R::Out, Bmp280Error<Self::Error>>;

    fn write<W: Writable>(&mut self, v: &W::In) -> Result<(), Bmp280Error<Self::Error>>;

    /// Blocks for at least `ms` milliseconds.
    fn wait_ms(&mut self, ms: u32);
}

/// [`Bus`] implementation over a blocking I2C peripheral.
///
/// Every register transaction is a register-pointer write followed by a
/// [`SETTLE_TIME_MS`] wait and, for reads, the data transfer. The two-phase
/// shape (rather than a combined write-read) is what UART-to-I2C bridges
/// require.
pub struct I2cBus<I2C, D> {
    i2c: I2C,
    delay: D,
    address: SevenBitAddress,
}

impl<I2C, D> I2cBus<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, address: SevenBitAddress, delay: D) -> Self {
        Self { i2c, delay, address }
    }

    /// Releases the underlying peripherals.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> Bus for I2cBus<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn read<R: Readable>(&mut self) -> Result<R::Out, Bmp280Error<Self::Error>> {
        let mut buf = [0u8; MAX_REG_BYTES];

        self.i2c
            .write(self.address, &[R::ADDR])
            .map_err(Bmp280Error::Bus)?;
        self.delay.delay_ms(SETTLE_TIME_MS);
        self.i2c
            .read(self.address, &mut buf[..R::N])
            .map_err(Bmp280Error::Bus)?;

        R::decode(&buf[..R::N]).map_err(Bmp280Error::UnexpectedRegisterData)
    }

    fn write<W: Writable>(&mut self, v: &W::In) -> Result<(), Bmp280Error<Self::Error>> {
        self.i2c
            .write(self.address, &[W::ADDR, W::encode(v)])
            .map_err(Bmp280Error::Bus)?;
        self.delay.delay_ms(SETTLE_TIME_MS);

        Ok(())
    }

    fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{ChipId, CtrlMeas, CtrlMeasCfg, Oversampling, PowerMode, TemperatureData};
    use crate::PRIMARY_ADDRESS;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    #[test]
    fn read_is_pointer_write_then_data_read() {
        let mut i2c = Mock::new(&[
            Transaction::write(PRIMARY_ADDRESS, vec![0xD0]),
            Transaction::read(PRIMARY_ADDRESS, vec![0x58]),
        ]);

        let mut bus = I2cBus::new(i2c.clone(), PRIMARY_ADDRESS, NoopDelay);
        assert_eq!(0x58, bus.read::<ChipId>().unwrap());

        i2c.done();
    }

    #[test]
    fn burst_read_transfers_full_block() {
        let mut i2c = Mock::new(&[
            Transaction::write(PRIMARY_ADDRESS, vec![0xFA]),
            Transaction::read(PRIMARY_ADDRESS, vec![0x7E, 0xF5, 0x00]),
        ]);

        let mut bus = I2cBus::new(i2c.clone(), PRIMARY_ADDRESS, NoopDelay);
        assert_eq!(0x7EF50, bus.read::<TemperatureData>().unwrap());

        i2c.done();
    }

    #[test]
    fn write_sends_address_and_encoded_byte() {
        let mut i2c = Mock::new(&[Transaction::write(PRIMARY_ADDRESS, vec![0xF4, 0b011_011_11])]);

        let mut bus = I2cBus::new(i2c.clone(), PRIMARY_ADDRESS, NoopDelay);
        bus.write::<CtrlMeas>(&CtrlMeasCfg {
            osrs_t: Oversampling::X4,
            osrs_p: Oversampling::X4,
            mode: PowerMode::Normal,
        })
        .unwrap();

        i2c.done();
    }

    #[test]
    fn transport_errors_propagate_unmodified() {
        let mut i2c = Mock::new(&[
            Transaction::write(PRIMARY_ADDRESS, vec![0xD0]).with_error(ErrorKind::Other),
        ]);

        let mut bus = I2cBus::new(i2c.clone(), PRIMARY_ADDRESS, NoopDelay);
        assert!(matches!(bus.read::<ChipId>(), Err(Bmp280Error::Bus(_))));

        i2c.done();
    }
}
