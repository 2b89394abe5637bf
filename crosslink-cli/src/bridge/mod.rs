//! Minimal MCP2221 driver used as the CrossLink's I2C transport and reset line.
//!
//! Only the HID commands needed for I2C transfers and for driving one GP pin
//! are implemented. The GP pin must already be set up for GPIO operation in the
//! MCP2221's flash or SRAM settings.
use std::time::Duration;

use bit_field::BitField;
use hidapi::{HidApi, HidDevice};

use commands::{McpCommand, UsbReport};

mod commands;
mod gpio;
mod i2c;

pub(crate) use gpio::{GpPin, ResetPin};
pub(crate) use i2c::I2cBus;

/// Largest I2C transfer the MCP2221 can make, in bytes.
pub(crate) const MAX_I2C_TRANSFER: usize = u16::MAX as usize;

const COMMAND_SUCCESS: u8 = 0x00;
/// Attempts made when the I2C engine reports it is busy.
const MAX_RETRIES: u8 = 20;
const RETRY_DELAY: Duration = Duration::from_millis(2);

/// Problems when talking to the MCP2221 or through it.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BridgeError {
    /// A command did not complete; the enclosed code replaced the success code.
    #[error("MCP2221 command failed with code {0:#04x}")]
    CommandFailed(u8),
    /// The command code echoed back was not the one sent.
    #[error("MCP2221 echoed command {received:#04x} for {sent:#04x}")]
    MismatchedCommandCodeEcho {
        /// Command code that was sent.
        sent: u8,
        /// Command code echoed back.
        received: u8,
    },
    /// The I2C engine was busy; the command may be retried.
    #[error("MCP2221 I2C engine busy")]
    I2cEngineBusy,
    /// The I2C engine could not hand back read data yet; may be retried.
    #[error("MCP2221 I2C engine read error")]
    I2cEngineReadError,
    /// No target acknowledged the address.
    #[error("I2C address not acknowledged")]
    I2cAddressNack,
    /// More than 65,535 bytes in a single transfer.
    #[error("I2C transfer longer than 65,535 bytes")]
    I2cTransferTooLong,
    /// A zero-length transfer, which can lock up the bus.
    #[error("zero-length I2C transfer")]
    I2cTransferEmpty,
    /// The MCP2221 cannot read and then write without a STOP in between.
    #[error("I2C transaction with a read before a write is not supported")]
    I2cUnsupportedTransaction,
    /// The GP pin chosen for the reset line is not in GPIO mode.
    #[error("{0} is not configured for GPIO operation")]
    PinNotGpio(GpPin),
    /// The USB HID layer failed.
    #[error("USB HID error: {0}")]
    HidApi(#[from] hidapi::HidError),
}

/// An MCP2221 USB to I2C and GPIO bridge.
pub(crate) struct Mcp2221 {
    inner: HidDevice,
}

impl Mcp2221 {
    /// Connect to the first USB device found with the given vendor and product ID.
    pub(crate) fn connect_with_vid_and_pid(
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Self, BridgeError> {
        let hidapi = HidApi::new()?;
        let device = hidapi.open(vendor_id, product_id)?;
        Ok(Self { inner: device })
    }

    /// The I2C bus, as an [`embedded_hal::i2c::I2c`] implementation.
    pub(crate) fn i2c(&self) -> I2cBus<'_> {
        I2cBus::new(self)
    }

    /// Use `pin` as the CrossLink reset line.
    ///
    /// The pin is switched to an output immediately, driven to `idle_high`.
    pub(crate) fn reset_pin(
        &self,
        pin: GpPin,
        idle_high: bool,
    ) -> Result<ResetPin<'_>, BridgeError> {
        ResetPin::new(self, pin, idle_high)
    }

    /// Write the given command to the MCP2221 and read the 64-byte response.
    fn transfer(&self, command: &UsbReport) -> Result<[u8; 64], BridgeError> {
        let out_command_byte = command.write_buffer[0];
        let written = self.inner.write(&command.report_bytes())?;

        let mut read_buffer = [0u8; 64];
        let read = self.inner.read(&mut read_buffer)?;
        let read_command_byte = read_buffer[0];

        assert_eq!(written, 65, "Didn't write full report.");
        assert_eq!(read, 64, "Didn't read full report.");

        if read_command_byte != out_command_byte {
            return Err(BridgeError::MismatchedCommandCodeEcho {
                sent: out_command_byte,
                received: read_command_byte,
            });
        }

        let status_code = read_buffer[1];
        if status_code == COMMAND_SUCCESS {
            Ok(read_buffer)
        } else {
            command
                .check_error_code(status_code)
                .and(Err(BridgeError::CommandFailed(status_code)))
        }
    }

    /// Read the I2C engine state: (idle, address acknowledged).
    ///
    /// See table 3-2 of the datasheet, bytes 8 and 20.
    fn i2c_status(&self) -> Result<(bool, bool), BridgeError> {
        let buf = self.transfer(&UsbReport::new(McpCommand::StatusSetParameters))?;
        // A cleared bit 6 means the target acknowledged.
        Ok((buf[8] == 0x00, !buf[20].get_bit(6)))
    }

    /// Cancel the current I2C transfer, forcing a STOP onto the bus.
    ///
    /// Nothing is sent if the engine is idle, as cancelling an idle engine
    /// leaves it stuck busy.
    fn i2c_cancel_transfer(&self) -> Result<(), BridgeError> {
        let (idle, _) = self.i2c_status()?;
        if idle {
            return Ok(());
        }
        let mut command = UsbReport::new(McpCommand::StatusSetParameters);
        command.set_data_byte(2, 0x10);
        self.transfer(&command)?;
        Ok(())
    }
}
