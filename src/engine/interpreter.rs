// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes every instruction on every tick

use super::{Engine, Strategy};
use crate::{
    cpu::{instruction::Instruction, CPU},
    error::Result,
};

/// The simplest [Engine]: fetch, decode, execute, repeat
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Interpreter;

impl Engine for Interpreter {
    /// Executes a single instruction
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// assert_eq!(1, Interpreter.tick(&mut cpu).unwrap());
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// ```
    fn tick(&mut self, cpu: &mut CPU) -> Result<usize> {
        let pc = cpu.pc();
        let instruction = Instruction::decode(cpu.fetch(pc));
        log::trace!("{pc:03x}: {instruction}");
        cpu.advance();
        cpu.execute(instruction)?;
        cpu.retire();
        Ok(1)
    }

    fn strategy(&self) -> Strategy {
        Strategy::Interpreter
    }
}
