// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for Trill

use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Trill.
///
/// Unrecognized opcodes are *not* errors: they decode to a no-op, so data
/// sitting in program memory never stops the machine.
#[derive(Debug, Error)]
pub enum Error {
    /// Executed `00ee` (ret) with nothing on the call stack
    #[error("return at {addr:03x} with an empty call stack")]
    StackUnderflow {
        /// The address of the offending `ret`
        addr: u16,
    },
    /// The call stack grew past the limit imposed by the front end
    #[error("call stack depth {depth} exceeds limit of {limit}")]
    StackOverflow {
        /// The depth of the call stack
        depth: usize,
        /// The configured limit
        limit: usize,
    },
    /// Tried to press a key that doesn't exist
    #[error("tried to press key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// Tried to convert string into mode, but it did not match.
    #[error("no suitable conversion of \"{mode}\" into Mode")]
    InvalidMode {
        /// The string which failed to become a mode
        mode: String,
    },
    /// Tried to convert string into an execution strategy, but it did not match.
    #[error("no suitable conversion of \"{strategy}\" into Strategy")]
    InvalidStrategy {
        /// The string which failed to become a strategy
        strategy: String,
    },
    /// A construction parameter makes no sense
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with it
        reason: String,
    },
    /// The program doesn't fit between the start address and the end of memory
    #[error("program of {len} bytes does not fit in {room} bytes at {start:03x}")]
    RomTooLarge {
        /// Length of the program
        len: usize,
        /// Bytes available at the start address
        room: usize,
        /// The start address
        start: u16,
    },
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
