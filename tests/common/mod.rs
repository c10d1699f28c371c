//! Simulated CAP1188 register file plus recording pin and delay, sharing one operation log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use cap1188_rs::Event;
use cap1188_rs::data_types::LineLevel;
use cap1188_rs::registers::addr;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, Operation};

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Write(Vec<u8>),
    Read(u8),
    Pin(LineLevel),
    Delay(u32),
    Event(Event),
}

pub type Log = Rc<RefCell<Vec<Op>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Register-pointer based chip model: a write sets the pointer then stores data bytes,
/// a read returns bytes from the pointer on.
pub struct FakeChip {
    pub address: u8,
    pub regs: [u8; 256],
    /// Values returned by successive SENSOR_INPUT_STATUS reads before falling back to `regs`.
    pub status_script: VecDeque<u8>,
    /// Number of upcoming SENSOR_INPUT_STATUS reads that fail.
    pub failing_status_reads: usize,
    /// Fail every transaction that writes register data.
    pub fail_data_writes: bool,
    pointer: u8,
    log: Log,
}

impl FakeChip {
    pub fn new(address: u8, log: Log) -> Self {
        Self {
            address,
            regs: [0; 256],
            status_script: VecDeque::new(),
            failing_status_reads: 0,
            fail_data_writes: false,
            pointer: 0,
            log,
        }
    }

    pub fn with_status(mut self, script: &[u8]) -> Self {
        self.status_script.extend(script.iter().copied());
        self
    }

    fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address));
        }
        if let Some(Operation::Write(bytes)) = operations.first() {
            if self.fail_data_writes && bytes.len() > 1 {
                return Err(ErrorKind::Other);
            }
            if bytes.first() == Some(&addr::SENSOR_INPUT_STATUS) && self.failing_status_reads > 0 {
                self.failing_status_reads -= 1;
                return Err(ErrorKind::Other);
            }
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.log.borrow_mut().push(Op::Write(bytes.to_vec()));
                    if let Some((reg, data)) = bytes.split_first() {
                        self.pointer = *reg;
                        for (i, b) in data.iter().enumerate() {
                            self.regs[reg.wrapping_add(i as u8) as usize] = *b;
                        }
                    }
                }
                Operation::Read(buf) => {
                    self.log.borrow_mut().push(Op::Read(self.pointer));
                    for (i, b) in buf.iter_mut().enumerate() {
                        let reg = self.pointer.wrapping_add(i as u8);
                        *b = if reg == addr::SENSOR_INPUT_STATUS {
                            self.status_script
                                .pop_front()
                                .unwrap_or(self.regs[reg as usize])
                        } else {
                            self.regs[reg as usize]
                        };
                    }
                }
            }
        }
        Ok(())
    }
}

impl i2c::ErrorType for FakeChip {
    type Error = ErrorKind;
}

impl i2c::I2c for FakeChip {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for FakeChip {
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}

pub struct FakePin {
    pub fail: bool,
    log: Log,
}

impl FakePin {
    pub fn new(log: Log) -> Self {
        Self { fail: false, log }
    }

    fn drive(&mut self, level: LineLevel) -> Result<(), digital::ErrorKind> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        self.log.borrow_mut().push(Op::Pin(level));
        Ok(())
    }
}

impl digital::ErrorType for FakePin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(LineLevel::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(LineLevel::High)
    }
}

/// Returns immediately, recording the requested duration in milliseconds.
pub struct FakeDelay {
    log: Log,
}

impl FakeDelay {
    pub fn new(log: Log) -> Self {
        Self { log }
    }
}

impl embedded_hal::delay::DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Op::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Op::Delay(ms));
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Op::Delay(ns / 1_000_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Op::Delay(ms));
    }
}

/// Bus operations the driver issues for `init` on a chip whose registers all read zero.
pub fn init_ops() -> Vec<Op> {
    let mut ops = Vec::new();
    let mut linking = 0u8;
    for channel in 0..8 {
        ops.push(Op::Write(vec![addr::SENSOR_INPUT_LINKING]));
        ops.push(Op::Read(addr::SENSOR_INPUT_LINKING));
        linking |= 1 << channel;
        ops.push(Op::Write(vec![addr::SENSOR_INPUT_LINKING, linking]));
    }
    ops.push(Op::Write(vec![addr::MULTI_TOUCH_CONFIG]));
    ops.push(Op::Read(addr::MULTI_TOUCH_CONFIG));
    ops.push(Op::Write(vec![addr::MULTI_TOUCH_CONFIG, 0x00]));
    ops.push(Op::Write(vec![addr::STANDBY_CONFIG, 0x30]));
    ops
}

/// Number of SENSOR_INPUT_STATUS reads in the log.
pub fn status_reads(log: &Log) -> usize {
    log.borrow()
        .iter()
        .filter(|op| **op == Op::Read(addr::SENSOR_INPUT_STATUS))
        .count()
}
