use std::num::NonZeroUsize;

/// Driver configuration.
///
/// The defaults match a CrossLink on its factory I2C address with `CRESET_B`
/// wired directly to a GPIO.
///
/// ```rust
/// # use crosslink_fpga::{Config, ResetPolarity, ResetPolicy};
/// # use std::num::NonZeroUsize;
/// let config = Config::default()
///     .with_address(0x41)
///     .with_max_transfer(NonZeroUsize::new(4096).unwrap())
///     .with_reset_policy(ResetPolicy::attempts(3));
/// assert_eq!(config.address, 0x41);
/// assert_eq!(config.reset_polarity, ResetPolarity::ActiveLow);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// 7-bit I2C address of the configuration port.
    pub address: u8,
    /// Largest number of bytes the I2C controller can move in one write.
    ///
    /// The bitstream burst is split into chunks of at most this length. Linux and
    /// most USB bridges limit a single message to 65,535 bytes.
    pub max_transfer: NonZeroUsize,
    /// Electrical polarity of the reset line.
    pub reset_polarity: ResetPolarity,
    /// How many reset sequences to attempt before giving up.
    pub reset_policy: ResetPolicy,
}

impl Config {
    /// Default 7-bit address of the CrossLink I2C configuration port.
    pub const DEFAULT_ADDRESS: u8 = 0x40;
    /// Default maximum transfer length.
    pub const DEFAULT_MAX_TRANSFER: NonZeroUsize = NonZeroUsize::new(u16::MAX as usize).unwrap();

    /// Use a different I2C address.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Limit the size of each bitstream chunk.
    pub fn with_max_transfer(mut self, max_transfer: NonZeroUsize) -> Self {
        self.max_transfer = max_transfer;
        self
    }

    /// Set the reset line polarity.
    pub fn with_reset_polarity(mut self, polarity: ResetPolarity) -> Self {
        self.reset_polarity = polarity;
        self
    }

    /// Set the reset retry policy.
    pub fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: Self::DEFAULT_ADDRESS,
            max_transfer: Self::DEFAULT_MAX_TRANSFER,
            reset_polarity: ResetPolarity::ActiveLow,
            reset_policy: ResetPolicy::default(),
        }
    }
}

/// Which logic level holds the CrossLink in reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolarity {
    /// Driving the pin low asserts reset. This is `CRESET_B` wired directly.
    ActiveLow,
    /// Driving the pin high asserts reset, as with an inverting buffer.
    ActiveHigh,
}

/// Bounded retry of the reset sequence.
///
/// Every second power-on reset leaves the CrossLink answering every I2C command
/// with `0xFF`, which shows up as a wrong IDCODE. Running the sequence a second
/// time clears it, hence the default of two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    max_attempts: u8,
}

impl ResetPolicy {
    /// Number of attempts needed to get past the alternating-reset defect.
    pub const DEFAULT_ATTEMPTS: u8 = 2;

    /// Allow up to `max_attempts` reset sequences. Zero is treated as one.
    pub const fn attempts(max_attempts: u8) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self { max_attempts }
    }

    /// Run the reset sequence exactly once.
    pub const fn single() -> Self {
        Self::attempts(1)
    }

    /// Maximum number of reset sequences.
    pub const fn max_attempts(&self) -> u8 {
        self.max_attempts
    }
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self::attempts(Self::DEFAULT_ATTEMPTS)
    }
}

#[cfg(test)]
mod test {
    use super::{Config, ResetPolicy};

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(ResetPolicy::attempts(0).max_attempts(), 1);
    }

    #[test]
    fn default_allows_a_u16_length_message() {
        assert_eq!(Config::default().max_transfer.get(), 65_535);
        assert_eq!(Config::default().reset_policy.max_attempts(), 2);
    }
}
