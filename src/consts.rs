pub const IDENTIFIER_LENGTH: usize = 43;
pub const MAX_URL_LENGTH: usize = 100;

pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const BINARY_INTEGER_MAX_BYTES: usize = 16; // u128
pub const MAX_RETAINED_EPOCHS: u128 = 10_000;
