// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Represents latches that aid in implementation but aren't a part of the Chip-8 architecture

/// Represents latches that aid in operation, but aren't inherent to the CPU
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Flags {
    /// Set when a sprite was drawn this frame, and the next draw must wait
    pub draw_wait: bool,
    /// Set when `Fx0A` has captured a key, and is waiting for it to be released
    pub key_release: bool,
    /// Set when the screen has changed since the front end last looked at it
    pub dirty: bool,
}

impl Flags {
    /// Latches for a machine that has yet to show its first frame
    pub fn new() -> Self {
        Flags {
            dirty: true,
            ..Default::default()
        }
    }
}
