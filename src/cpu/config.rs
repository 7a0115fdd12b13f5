// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Construction parameters for the [super::CPU]

use super::{quirks::Quirks, FONT};
use crate::error::{Error, Result};

/// Rate at which the delay and sound timers count down
pub const TIMER_FREQ: usize = 60;
/// Target instruction throughput
pub const INSTRUCTION_FREQ: usize = 600;
/// Number of instructions retired per timer frame
pub const RATIO: usize = INSTRUCTION_FREQ / TIMER_FREQ;

/// Parameters fixed for the lifetime of a [super::CPU]
///
/// | value         | default  | description
/// |---------------|----------|------------
/// | start         | `0x200`  | Load address and initial pc
/// | memory_size   | `0x1000` | Bytes of addressable memory
/// | ratio         | `10`     | Instructions per timer frame
/// | quirks        | Chip-8   | See [Quirks]
/// | seed          | `None`   | Seed for `Cxbb`, or [None] for entropy
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Where the program is loaded, and where execution begins
    pub start: u16,
    /// Size of memory. At most `0x1000`, the 12-bit address space.
    pub memory_size: usize,
    /// Instruction frequency / timer frequency
    pub ratio: usize,
    /// Selects historically divergent behaviors
    pub quirks: Quirks,
    /// Seeds the random number generator
    pub seed: Option<u64>,
}

impl Config {
    /// Checks the parameters for consistency
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// assert!(Config::default().validate().is_ok());
    /// assert!(Config { ratio: 0, ..Default::default() }.validate().is_err());
    /// assert!(Config { start: 0x1000, ..Default::default() }.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let reason = if self.ratio == 0 {
            "ratio must be at least 1".to_string()
        } else if self.memory_size > 0x1000 {
            format!("{:#x} bytes of memory exceeds the address space", self.memory_size)
        } else if (self.start as usize) < FONT.len() {
            format!("start {:03x} overlaps the font", self.start)
        } else if self.start as usize >= self.memory_size {
            format!("start {:03x} is outside memory", self.start)
        } else {
            return Ok(());
        };
        Err(Error::InvalidConfig { reason })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start: 0x200,
            memory_size: 0x1000,
            ratio: RATIO,
            quirks: Quirks::default(),
            seed: None,
        }
    }
}
