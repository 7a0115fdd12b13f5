// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Trill is a Chip-8 virtual machine with interchangeable execution engines.
//!
//! The [CPU] holds the machine state and knows how to execute one decoded
//! [Instruction]. An [Engine] decides how instructions get from memory to the
//! CPU: decoded every time ([Interpreter]), decoded once up front ([Cached]),
//! or fused into basic blocks ([Blocks]). All of them retire instructions
//! identically.
//!
//! ```rust
//! use trill::*;
//! let mut cpu = CPU::default();
//! cpu.load_program_bytes(&[
//!     0x60, 0x05, // mov #05, v0
//!     0xf0, 0x29, // font v0, I
//!     0xd0, 0x05, // draw #5, v0, v0
//!     0x12, 0x06, // jmp 206
//! ])?;
//! let mut chip8 = Chip8::new(cpu, Strategy::Blocks);
//! chip8.multistep(10)?;
//! assert!(chip8.cpu.screen().any());
//! # Ok::<(), Error>(())
//! ```

pub mod bitmap;
pub mod cpu;
pub mod engine;
pub mod error;

pub use bitmap::Bitmap;
pub use cpu::{
    config::Config,
    flags::Flags,
    instruction::{Insn, Instruction},
    mode::Mode,
    quirks::Quirks,
    CPU, FONT,
};
pub use engine::{Block, Blocks, Cached, Engine, Interpreter, Strategy};
pub use error::{Error, Result};

/// Holds the state of a Chip-8 machine, and the [Engine] driving it
#[derive(Debug)]
pub struct Chip8 {
    /// Contains the registers, memory, and I/O of the Chip-8
    pub cpu: CPU,
    engine: Box<dyn Engine>,
    stack_limit: Option<usize>,
}

impl Chip8 {
    /// Builds an [Engine] for a CPU whose program is already loaded.
    ///
    /// Loading a new program afterwards requires a new [Chip8], since the
    /// caching engines would keep running the old one.
    pub fn new(cpu: CPU, strategy: Strategy) -> Self {
        let engine = strategy.build(&cpu);
        log::debug!("built {strategy} engine");
        Chip8 {
            cpu,
            engine,
            stack_limit: None,
        }
    }

    /// Fails with [Error::StackOverflow] once the call stack grows past `limit`
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[0x22, 0x00])?; // call 200
    /// let mut chip8 = Chip8::new(cpu, Strategy::Interpreter).with_stack_limit(Some(12));
    /// assert!(chip8.multistep(12).is_ok());
    /// assert!(matches!(
    ///     chip8.tick(),
    ///     Err(Error::StackOverflow { depth: 13, limit: 12 })
    /// ));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn with_stack_limit(self, stack_limit: Option<usize>) -> Self {
        Self {
            stack_limit,
            ..self
        }
    }

    /// Gets the [Strategy] of the current [Engine]
    pub fn strategy(&self) -> Strategy {
        self.engine.strategy()
    }

    /// Runs one unit of work, and returns the number of instructions retired
    pub fn tick(&mut self) -> Result<usize> {
        let retired = self.engine.tick(&mut self.cpu)?;
        self.check_stack()?;
        Ok(retired)
    }

    /// Runs until at least `instructions` instructions have retired,
    /// and returns the number actually retired
    pub fn multistep(&mut self, instructions: usize) -> Result<usize> {
        let mut retired = 0;
        while retired < instructions {
            retired += self.tick()?;
        }
        Ok(retired)
    }

    fn check_stack(&self) -> Result<()> {
        match self.stack_limit {
            Some(limit) if self.cpu.stack().len() > limit => Err(Error::StackOverflow {
                depth: self.cpu.stack().len(),
                limit,
            }),
            _ => Ok(()),
        }
    }
}

/// Common imports for Trill
pub mod prelude {
    pub use super::{
        Bitmap, Chip8, Config, Engine, Error, Insn, Instruction, Mode, Quirks, Result,
        Strategy, CPU, FONT,
    };
}
