//! In-memory [`Bus`] double for driver-level tests.
//!
//! Responses are canned per `(address, length)` pair; writes are recorded so
//! tests can assert on the exact bytes the driver would put on the wire.
//! `wait_ms` is a counter rather than a sleep, so timing contracts are
//! observable without slowing the suite down.

use std::collections::HashMap;
use std::vec::Vec;

use crate::bus::{Bus, MAX_REG_BYTES};
use crate::error::Bmp280Error;
use crate::register::{Readable, Writable};

#[derive(Debug)]
enum RegisterValue {
    Data { bytes: [u8; MAX_REG_BYTES], len: usize },
    Fail,
}

pub(crate) struct FakeBus {
    regs: HashMap<(u8, usize), RegisterValue>,
    pub writes: Vec<(u8, u8)>,
    pub waited_ms: u32,
}

impl FakeBus {
    pub fn new() -> Self {
        FakeBus {
            regs: HashMap::new(),
            writes: Vec::new(),
            waited_ms: 0,
        }
    }

    pub fn with_response<R: Readable>(&mut self, data: &[u8]) {
        let mut bytes = [0u8; MAX_REG_BYTES];
        bytes[..data.len()].copy_from_slice(data);
        self.regs
            .insert((R::ADDR, R::N), RegisterValue::Data { bytes, len: data.len() });
    }

    /// Makes every read of `R` fail with a bus error.
    pub fn with_failing_read<R: Readable>(&mut self) {
        self.regs.insert((R::ADDR, R::N), RegisterValue::Fail);
    }

    /// The value most recently written to `addr`, if any.
    pub fn last_write(&self, addr: u8) -> Option<u8> {
        self.writes
            .iter()
            .rev()
            .find(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
    }
}

impl Bus for FakeBus {
    type Error = ();

    fn read<R: Readable>(&mut self) -> Result<R::Out, Bmp280Error<Self::Error>> {
        match self.regs.get(&(R::ADDR, R::N)) {
            Some(RegisterValue::Data { bytes, len }) if *len == R::N => {
                R::decode(&bytes[..R::N]).map_err(Bmp280Error::UnexpectedRegisterData)
            }
            Some(RegisterValue::Fail) => Err(Bmp280Error::Bus(())),
            _ => panic!("no canned value for register {:#04x} length {}", R::ADDR, R::N),
        }
    }

    fn write<W: Writable>(&mut self, v: &W::In) -> Result<(), Bmp280Error<Self::Error>> {
        self.writes.push((W::ADDR, W::encode(v)));

        Ok(())
    }

    fn wait_ms(&mut self, ms: u32) {
        self.waited_ms += ms;
    }
}
