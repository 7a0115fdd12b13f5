// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Interchangeable strategies for driving a [CPU]
//!
//! | strategy       | fetch                | decode              |
//! |----------------|----------------------|---------------------|
//! | [Interpreter]  | read memory          | every tick          |
//! | [Cached]       | index a decode cache | once, up front      |
//! | [Blocks]       | index a block cache  | once, fused lazily  |
//!
//! All three retire instructions identically: given the same program and
//! starting state, they agree after the same number of retired instructions.

pub mod blocks;
pub mod cached;
pub mod interpreter;

pub use blocks::{Block, Blocks};
pub use cached::Cached;
pub use interpreter::Interpreter;

use crate::{
    cpu::CPU,
    error::{Error, Result},
};
use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

/// Drives a [CPU] one unit of work at a time
pub trait Engine: Debug {
    /// Runs the next unit of work, and returns the number of instructions retired.
    ///
    /// The timer cadence is stepped once per retired instruction.
    fn tick(&mut self, cpu: &mut CPU) -> Result<usize>;

    /// Reports which [Strategy] this is
    fn strategy(&self) -> Strategy;
}

/// Selects an [Engine]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    /// Decode every instruction as it's fetched
    Interpreter,
    /// Decode the whole program once, up front
    #[default]
    Cached,
    /// Fuse cached instructions into basic blocks
    Blocks,
}

impl Strategy {
    /// Builds the selected [Engine] for a CPU whose program is already loaded
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let cpu = CPU::default();
    /// let engine = Strategy::Blocks.build(&cpu);
    /// assert_eq!(Strategy::Blocks, engine.strategy());
    /// ```
    pub fn build(self, cpu: &CPU) -> Box<dyn Engine> {
        match self {
            Strategy::Interpreter => Box::new(Interpreter),
            Strategy::Cached => Box::new(Cached::new(cpu)),
            Strategy::Blocks => Box::new(Blocks::new(cpu)),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interpreter" | "basic" | "b" => Ok(Strategy::Interpreter),
            "cached" | "predecoded" | "pd" => Ok(Strategy::Cached),
            "blocks" | "basicblock" | "bb" => Ok(Strategy::Blocks),
            _ => Err(Error::InvalidStrategy {
                strategy: s.to_string(),
            }),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Strategy::Interpreter => "interpreter",
                Strategy::Cached => "cached",
                Strategy::Blocks => "blocks",
            }
        )
    }
}
