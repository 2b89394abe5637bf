//! Settle delays between configuration commands, in milliseconds.

/// After releasing `CRESET_B`, before the first ISC command.
pub const RESET_SETTLE_MS: u32 = 10;

/// Between `ISC_ENABLE` and `ISC_ERASE`.
pub const ENABLE_SETTLE_MS: u32 = 1;

/// After `ISC_ERASE`, before any further command.
pub const ERASE_SETTLE_MS: u32 = 50;

/// After `LSC_INIT`, before the bitstream burst.
pub const INIT_SETTLE_MS: u32 = 100;
