// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Controls the [Quirks] behavior of the CPU on a granular level.

use super::mode::Mode;

/// Controls the quirk behavior of the CPU on a granular level.
///
/// Each toggle picks between two historically observed behaviors.
/// The [Default] is Cosmac-VIP-like behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quirks {
    /// Binary ops in `8xy`(`1`, `2`, `3`) set vF to 0
    pub vf_reset: bool,
    /// DMA instructions `Fx55`/`Fx65` leave I at I + x + 1
    pub memory_increment: bool,
    /// Draw operations wait for the next timer tick, at most one per frame
    pub display_wait: bool,
    /// Sprites are clipped at the bottom and right edges, instead of wrapping
    pub clipping: bool,
    /// Shift ops in `8xy`(`6`, `E`) shift vX in place, instead of sourcing from vY
    pub shifting: bool,
    /// Indexed jump `Baaa` goes to `adr` + v`x`, where `x` is the high nibble of `adr`
    pub jumping: bool,
}

impl From<Mode> for Quirks {
    fn from(value: Mode) -> Self {
        match value {
            Mode::Chip8 => Quirks {
                vf_reset: true,
                memory_increment: true,
                display_wait: true,
                clipping: true,
                shifting: false,
                jumping: false,
            },
            Mode::SChip => Quirks {
                vf_reset: false,
                memory_increment: false,
                display_wait: false,
                clipping: true,
                shifting: true,
                jumping: true,
            },
            Mode::XOChip => Quirks {
                vf_reset: false,
                memory_increment: true,
                display_wait: false,
                clipping: false,
                shifting: false,
                jumping: false,
            },
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Self::from(Mode::Chip8)
    }
}
