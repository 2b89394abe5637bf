use super::BridgeError;

/// The subset of MCP2221 HID commands needed to drive I2C and one GPIO.
#[derive(Debug, Clone, Copy)]
pub(crate) enum McpCommand {
    /// Poll the I2C engine, or cancel the current transfer.
    ///
    /// See section 3.1.1 of the datasheet.
    StatusSetParameters,
    /// Change GPIO pin output direction and logic level.
    ///
    /// See section 3.1.11 of the datasheet.
    SetGpioOutputValues,
    /// Retrieve the GPIO direction and pin value for those pins set to GPIO operation.
    ///
    /// See section 3.1.12 of the datasheet.
    GetGpioValues,
    /// Request a read from an I2C target.
    ///
    /// The data comes back in response to [`McpCommand::I2cGetData`].
    I2cReadData,
    /// Request a read from an I2C target with a repeated START condition.
    I2cReadDataRepeatedStart,
    /// Read requested I2C data back from the MCP2221.
    ///
    /// See section 3.1.10 of the datasheet.
    I2cGetData,
    /// Write data to an I2C target.
    ///
    /// See section 3.1.5 of the datasheet.
    I2cWriteData,
    /// Write data to an I2C target without a STOP condition.
    ///
    /// See section 3.1.7 of the datasheet.
    I2cWriteDataNoStop,
}

impl McpCommand {
    fn code(&self) -> u8 {
        match self {
            McpCommand::StatusSetParameters => 0x10,
            McpCommand::SetGpioOutputValues => 0x50,
            McpCommand::GetGpioValues => 0x51,
            McpCommand::I2cReadData => 0x91,
            McpCommand::I2cReadDataRepeatedStart => 0x93,
            McpCommand::I2cGetData => 0x40,
            McpCommand::I2cWriteData => 0x90,
            McpCommand::I2cWriteDataNoStop => 0x94,
        }
    }

    /// Check error code for command-specific errors.
    ///
    /// The I2C engine busy codes signal that the command should be tried again.
    fn check_error_code(&self, code: u8) -> Result<(), BridgeError> {
        match (code, self) {
            (0x01, Self::I2cWriteData)
            | (0x01, Self::I2cWriteDataNoStop)
            | (0x01, Self::I2cReadData)
            | (0x01, Self::I2cReadDataRepeatedStart) => Err(BridgeError::I2cEngineBusy),
            (0x41, Self::I2cGetData) => Err(BridgeError::I2cEngineReadError),
            (_, _) => Ok(()),
        }
    }
}

/// Outgoing 64-byte USB HID report.
pub(crate) struct UsbReport {
    command: McpCommand,
    pub(crate) write_buffer: [u8; 64],
}

impl UsbReport {
    pub(crate) fn new(command: McpCommand) -> Self {
        let mut write_buffer = [0u8; 64];
        write_buffer[0] = command.code();
        Self {
            command,
            write_buffer,
        }
    }

    /// The report prefixed with the (unused) HID report number, as hidapi wants it.
    pub(crate) fn report_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[1..65].copy_from_slice(&self.write_buffer);
        out
    }

    pub(crate) fn check_error_code(&self, code: u8) -> Result<(), BridgeError> {
        self.command.check_error_code(code)
    }

    /// Write a single data byte. The command byte at index 0 cannot be changed.
    pub(crate) fn set_data_byte(&mut self, byte_index: usize, value: u8) {
        assert!(byte_index < 64, "Byte index {byte_index} too large.");
        assert!(byte_index != 0, "Cannot write to command byte index.");
        self.write_buffer[byte_index] = value;
    }
}
