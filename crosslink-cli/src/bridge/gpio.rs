//! A GP pin driven as the CrossLink's `CRESET_B` line.
use embedded_hal::digital::{self, OutputPin};

use super::commands::{McpCommand, UsbReport};
use super::{BridgeError, Mcp2221};

/// One of the MCP2221's four GP pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum GpPin {
    Gp0,
    Gp1,
    Gp2,
    Gp3,
}

impl GpPin {
    fn index(&self) -> usize {
        match self {
            GpPin::Gp0 => 0,
            GpPin::Gp1 => 1,
            GpPin::Gp2 => 2,
            GpPin::Gp3 => 3,
        }
    }
}

impl std::fmt::Display for GpPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GP{}", self.index())
    }
}

/// A GP pin in GPIO output mode.
pub(crate) struct ResetPin<'a> {
    bridge: &'a Mcp2221,
    pin: GpPin,
}

impl<'a> ResetPin<'a> {
    /// Check the pin is in GPIO mode, then make it an output at its idle level.
    ///
    /// # Datasheet
    ///
    /// See table 3-35 for the Get GPIO Values response layout. A pin that is not
    /// set for GPIO operation reads back `0xEE` for its level.
    pub(super) fn new(
        bridge: &'a Mcp2221,
        pin: GpPin,
        idle_high: bool,
    ) -> Result<Self, BridgeError> {
        const NOT_GPIO: u8 = 0xEE;

        let values = bridge.transfer(&UsbReport::new(McpCommand::GetGpioValues))?;
        if values[2 + 2 * pin.index()] == NOT_GPIO {
            return Err(BridgeError::PinNotGpio(pin));
        }
        let mut reset_pin = Self { bridge, pin };
        reset_pin.drive(idle_high)?;
        Ok(reset_pin)
    }

    /// Set the pin as an output at the given level.
    ///
    /// # Datasheet
    ///
    /// See table 3-32 for the Set GPIO Output Values command layout. Each pin
    /// has four bytes: alter-level flag, level, alter-direction flag, direction.
    fn drive(&mut self, high: bool) -> Result<(), BridgeError> {
        const ENABLE_SETTING: u8 = 0x01;
        const DIRECTION_OUTPUT: u8 = 0x00;

        let base = 2 + 4 * self.pin.index();
        let mut command = UsbReport::new(McpCommand::SetGpioOutputValues);
        command.set_data_byte(base, ENABLE_SETTING);
        command.set_data_byte(base + 1, u8::from(high));
        command.set_data_byte(base + 2, ENABLE_SETTING);
        command.set_data_byte(base + 3, DIRECTION_OUTPUT);
        self.bridge.transfer(&command)?;
        Ok(())
    }
}

impl digital::Error for BridgeError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl digital::ErrorType for ResetPin<'_> {
    type Error = BridgeError;
}

impl OutputPin for ResetPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}
