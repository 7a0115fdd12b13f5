// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Couples instruction retirement to the 60Hz timer frame

/// Counts retired instructions, and reports when a timer frame has elapsed.
///
/// With a ratio of `R`, every `R`th call to [Clock::step] ends a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Clock {
    ratio: usize,
    counter: usize,
}

impl Clock {
    /// Constructs a new Clock which ends a frame every `ratio` instructions
    /// # Examples
    /// ```rust
    /// # use trill::cpu::clock::Clock;
    /// let mut clock = Clock::new(3);
    /// assert!(!clock.step());
    /// assert!(!clock.step());
    /// assert!(clock.step());
    /// assert!(!clock.step());
    /// ```
    pub fn new(ratio: usize) -> Self {
        let ratio = ratio.max(1);
        Clock {
            ratio,
            counter: ratio,
        }
    }

    /// Gets the number of instructions per timer frame
    pub fn ratio(&self) -> usize {
        self.ratio
    }

    /// Counts one retired instruction. Returns true when a frame boundary is crossed.
    #[inline(always)]
    pub fn step(&mut self) -> bool {
        self.counter -= 1;
        if self.counter == 0 {
            self.counter = self.ratio;
            true
        } else {
            false
        }
    }

    /// Restarts the current frame
    pub fn reset(&mut self) {
        self.counter = self.ratio;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(super::config::RATIO)
    }
}
