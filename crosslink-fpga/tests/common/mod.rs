//! Scripted stand-ins for the I2C bus, reset pin and delay.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use crosslink_fpga::{CROSSLINK_IDCODE, Command, Config, CrossLink};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, Operation};

pub const DONE: u32 = 1 << 16;
pub const BUSY: u32 = 1 << 20;
pub const FAIL: u32 = 1 << 21;

pub type Driver = CrossLink<MockBus, MockPin, MockDelay>;

/// Something the driver did to the bus, the reset pin or the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Reset pin driven (true = high).
    Pin(bool),
    /// Delay in milliseconds.
    Delay(u32),
    /// Transfer starting with this command.
    Bus(Command),
}

/// Event log shared by the bus, pin and delay of one driver.
pub type Events = Rc<RefCell<Vec<Event>>>;

/// One call to `I2c::transaction`, as seen on the bus.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub address: u8,
    /// Each write operation, in order. More than one means continuation chunks.
    pub writes: Vec<Vec<u8>>,
    pub read_len: Option<usize>,
}

impl Transfer {
    /// The command this transfer starts with.
    ///
    /// Continuation chunks are joined first, so a burst split mid-prefix is
    /// still recognised.
    pub fn command(&self) -> Option<Command> {
        let written = self.written();
        Command::from_frame(&written).or_else(|| {
            written
                .starts_with(Command::LscBitstreamBurst.frame())
                .then_some(Command::LscBitstreamBurst)
        })
    }

    /// All written bytes joined together.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

/// A CrossLink on the bus that answers reads from a script.
#[derive(Debug)]
pub struct MockBus {
    pub transfers: Vec<Transfer>,
    /// IDCODEs returned by successive reads; the real IDCODE once exhausted.
    pub idcodes: VecDeque<u32>,
    pub status: u32,
    pub usercode: u32,
    /// Answer `0xFF` to every read, as after a bad power-on reset.
    pub stuck: bool,
    /// Fail the next transfer of each listed command once, with the given kind.
    pub failures: Vec<(Command, ErrorKind)>,
    pub events: Events,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            transfers: Vec::new(),
            idcodes: VecDeque::new(),
            status: DONE,
            usercode: 0,
            stuck: false,
            failures: Vec::new(),
            events: Events::default(),
        }
    }

    pub fn with_idcodes(mut self, idcodes: &[u32]) -> Self {
        self.idcodes = idcodes.iter().copied().collect();
        self
    }

    pub fn with_status(mut self, status: u32) -> Self {
        self.status = status;
        self
    }

    pub fn failing(mut self, command: Command, kind: ErrorKind) -> Self {
        self.failures.push((command, kind));
        self
    }

    /// Everything recorded on the shared log, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Commands in the order they reached the bus.
    pub fn commands(&self) -> Vec<Command> {
        self.transfers.iter().filter_map(Transfer::command).collect()
    }

    /// The single bitstream burst transfer.
    pub fn burst(&self) -> &Transfer {
        let mut bursts = self
            .transfers
            .iter()
            .filter(|t| t.command() == Some(Command::LscBitstreamBurst));
        let burst = bursts.next().expect("no burst on the bus");
        assert!(bursts.next().is_none(), "more than one burst on the bus");
        burst
    }

    fn response(&mut self, command: Option<Command>) -> u32 {
        if self.stuck {
            return u32::MAX;
        }
        match command {
            Some(Command::ReadIdcode) => self.idcodes.pop_front().unwrap_or(CROSSLINK_IDCODE),
            Some(Command::LscReadStatus) => self.status,
            Some(Command::ReadUsercode) => self.usercode,
            _ => u32::MAX,
        }
    }
}

impl i2c::ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut transfer = Transfer {
            address,
            writes: Vec::new(),
            read_len: None,
        };
        for op in operations.iter() {
            match op {
                Operation::Write(bytes) => transfer.writes.push(bytes.to_vec()),
                Operation::Read(buf) => transfer.read_len = Some(buf.len()),
            }
        }
        let command = transfer.command();
        self.transfers.push(transfer);
        if let Some(command) = command {
            self.events.borrow_mut().push(Event::Bus(command));
        }

        if let Some(pos) = self
            .failures
            .iter()
            .position(|(failing, _)| Some(*failing) == command)
        {
            let (_, kind) = self.failures.remove(pos);
            return Err(kind);
        }

        let response = self.response(command).to_le_bytes();
        for op in operations.iter_mut() {
            if let Operation::Read(buf) = op {
                let len = buf.len().min(4);
                buf[..len].copy_from_slice(&response[..len]);
            }
        }
        Ok(())
    }
}

/// Reset pin that remembers every level it was driven to (true = high).
#[derive(Debug, Default)]
pub struct MockPin {
    pub levels: Vec<bool>,
    pub events: Events,
}

impl MockPin {
    fn drive(&mut self, high: bool) {
        self.levels.push(high);
        self.events.borrow_mut().push(Event::Pin(high));
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

/// Delay that only records the requested durations in milliseconds.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub ms: Vec<u32>,
    pub events: Events,
}

impl MockDelay {
    fn record(&mut self, ms: u32) {
        self.ms.push(ms);
        self.events.borrow_mut().push(Event::Delay(ms));
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.record(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record(ms);
    }
}

pub fn driver(bus: MockBus) -> Driver {
    driver_with(bus, Config::default())
}

/// Driver whose pin and delay log onto the bus's event log.
pub fn driver_with(bus: MockBus, config: Config) -> Driver {
    let pin = MockPin {
        events: bus.events.clone(),
        ..MockPin::default()
    };
    let delay = MockDelay {
        events: bus.events.clone(),
        ..MockDelay::default()
    };
    CrossLink::new(bus, pin, delay, config)
}
