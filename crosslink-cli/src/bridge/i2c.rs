//! I2C transfers through the MCP2221, and the embedded_hal I2C trait.
use embedded_hal::i2c::{self, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use super::commands::{McpCommand, UsbReport};
use super::{BridgeError, MAX_I2C_TRANSFER, MAX_RETRIES, Mcp2221, RETRY_DELAY};

/// Bytes of I2C data carried by each outgoing HID report.
const WRITE_CHUNK: usize = 60;
/// Data length reported by Get Data when the engine failed to read.
const GET_DATA_ERROR: u8 = 127;

/// The MCP2221's I2C bus.
///
/// The MCP2221 needs the length of a transfer up front and cannot resume a
/// write after ending a HID command, so every transaction is coalesced into at
/// most one write followed by at most one read.
pub(crate) struct I2cBus<'a> {
    bridge: &'a Mcp2221,
}

impl<'a> I2cBus<'a> {
    pub(super) fn new(bridge: &'a Mcp2221) -> Self {
        Self { bridge }
    }

    /// Write `data`, optionally leaving the bus without a STOP for a following read.
    fn write_data(&self, address: u8, data: &[u8], no_stop: bool) -> Result<(), BridgeError> {
        if data.is_empty() {
            return Err(BridgeError::I2cTransferEmpty);
        }
        let Ok([tx_len_low, tx_len_high]) = u16::try_from(data.len()).map(u16::to_le_bytes) else {
            return Err(BridgeError::I2cTransferTooLong);
        };

        let mut command = UsbReport::new(if no_stop {
            McpCommand::I2cWriteDataNoStop
        } else {
            McpCommand::I2cWriteData
        });
        command.set_data_byte(1, tx_len_low);
        command.set_data_byte(2, tx_len_high);
        command.set_data_byte(3, address << 1);

        for (idx, chunk) in data.chunks(WRITE_CHUNK).enumerate() {
            command.write_buffer[4..4 + chunk.len()].copy_from_slice(chunk);
            let mut retries = MAX_RETRIES;
            loop {
                match self.bridge.transfer(&command) {
                    Ok(_) => break,
                    Err(BridgeError::I2cEngineBusy) if retries > 0 => {
                        retries -= 1;
                        std::thread::sleep(RETRY_DELAY);
                    }
                    Err(e) => return Err(e),
                }
            }
            // The MCP2221 happily accepts data for a missing target, so check the
            // address was acknowledged after the first chunk.
            if idx == 0 {
                self.bail_for_nack()?;
            }
        }
        Ok(())
    }

    /// Read into `buffer`, with a repeated START if a write preceded it.
    fn read_data(
        &self,
        address: u8,
        buffer: &mut [u8],
        repeated_start: bool,
    ) -> Result<(), BridgeError> {
        if buffer.is_empty() {
            return Err(BridgeError::I2cTransferEmpty);
        }
        let Ok([tx_len_low, tx_len_high]) = u16::try_from(buffer.len()).map(u16::to_le_bytes)
        else {
            return Err(BridgeError::I2cTransferTooLong);
        };

        let mut command = UsbReport::new(if repeated_start {
            McpCommand::I2cReadDataRepeatedStart
        } else {
            McpCommand::I2cReadData
        });
        command.set_data_byte(1, tx_len_low);
        command.set_data_byte(2, tx_len_high);
        command.set_data_byte(3, address << 1 | 1);
        self.bridge.transfer(&command)?;
        self.bail_for_nack()?;
        self.get_data(buffer)
    }

    /// Collect read data from the MCP2221 after a read request.
    fn get_data(&self, buffer: &mut [u8]) -> Result<(), BridgeError> {
        let get_command = UsbReport::new(McpCommand::I2cGetData);
        let mut read_so_far = 0;
        let mut retries = MAX_RETRIES;

        while read_so_far < buffer.len() {
            match self.bridge.transfer(&get_command) {
                Ok(response) => {
                    retries = MAX_RETRIES;
                    if response[3] == GET_DATA_ERROR {
                        continue;
                    }
                    let length = usize::from(response[3]).min(buffer.len() - read_so_far);
                    buffer[read_so_far..read_so_far + length]
                        .copy_from_slice(&response[4..4 + length]);
                    read_so_far += length;
                }
                // The host can ask for data faster than the engine produces it.
                Err(BridgeError::I2cEngineReadError) if retries > 0 => {
                    retries -= 1;
                    std::thread::sleep(RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Cancel the transfer if the target did not acknowledge its address.
    fn bail_for_nack(&self) -> Result<(), BridgeError> {
        let (_, acknowledged) = self.bridge.i2c_status()?;
        if acknowledged {
            Ok(())
        } else {
            self.bridge.i2c_cancel_transfer()?;
            Err(BridgeError::I2cAddressNack)
        }
    }
}

/// Adjacent writes joined into one buffer, and the total length of the reads.
///
/// Fails for a read followed by a write, which the MCP2221 cannot do without an
/// intervening STOP.
fn coalesce(operations: &[Operation<'_>]) -> Result<(Vec<u8>, usize), BridgeError> {
    let mut write_data = Vec::new();
    let mut read_length = 0;
    let mut reading = false;
    for op in operations {
        match op {
            Operation::Write(_) if reading => {
                return Err(BridgeError::I2cUnsupportedTransaction);
            }
            Operation::Write(bytes) => write_data.extend_from_slice(bytes),
            Operation::Read(buf) => {
                reading = true;
                read_length += buf.len();
            }
        }
    }
    if write_data.len() > MAX_I2C_TRANSFER || read_length > MAX_I2C_TRANSFER {
        return Err(BridgeError::I2cTransferTooLong);
    }
    if write_data.is_empty() && read_length == 0 {
        return Err(BridgeError::I2cTransferEmpty);
    }
    Ok((write_data, read_length))
}

impl i2c::Error for BridgeError {
    fn kind(&self) -> i2c::ErrorKind {
        match self {
            BridgeError::I2cAddressNack => {
                i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            _ => i2c::ErrorKind::Other,
        }
    }
}

impl i2c::ErrorType for I2cBus<'_> {
    type Error = BridgeError;
}

impl I2c<SevenBitAddress> for I2cBus<'_> {
    /// Execute the operations as at most one write and one read.
    ///
    /// Consecutive writes are sent as a single write, so continuation chunks
    /// reach the target without a repeated START. A write followed by a read
    /// uses a repeated START between the two.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let (write_data, read_length) = coalesce(operations)?;

        if !write_data.is_empty() {
            self.write_data(address, &write_data, read_length > 0)?;
        }
        if read_length == 0 {
            return Ok(());
        }

        let mut read_data = vec![0u8; read_length];
        self.read_data(address, &mut read_data, !write_data.is_empty())?;
        let mut copied_so_far = 0;
        for op in operations.iter_mut() {
            if let Operation::Read(buf) = op {
                let end = copied_so_far + buf.len();
                buf.copy_from_slice(&read_data[copied_so_far..end]);
                copied_so_far = end;
            }
        }
        Ok(())
    }
}
