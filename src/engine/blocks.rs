// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Fuses runs of cached instructions into basic blocks
//!
//! A [Block] runs from its entry address up to and including the first
//! terminator (see [Insn::is_terminator](crate::cpu::instruction::Insn::is_terminator)).
//! Since only the final instruction of a block can touch the program counter,
//! the whole block can be dispatched at once.
//!
//! Like the [Cached] engine this is built on, blocks are never invalidated.

use super::{Cached, Engine, Strategy};
use crate::{
    cpu::{instruction::Instruction, ADDRESS_MASK, CPU},
    error::Result,
};

/// An immutable run of instructions ending in a terminator
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    start: u16,
    insns: Vec<Instruction>,
    len: u16,
}

impl Block {
    /// Scans forward from `start` until it reaches a terminator, or the end of memory
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x60, 0x01, // mov #01, v0
    ///     0x70, 0x01, // add #01, v0
    ///     0x12, 0x02, // jmp 202
    ///     0x00, 0xe0, // cls
    /// ]).unwrap();
    /// let block = Block::build(&Cached::new(&cpu), &cpu, 0x200);
    /// assert_eq!(3, block.instructions().len());
    /// assert_eq!(0x206, block.end());
    /// ```
    pub fn build(cached: &Cached, cpu: &CPU, start: u16) -> Self {
        let end = cpu.memory().len();
        let mut insns = vec![];
        let mut addr = start;
        loop {
            let insn = cached.get(cpu, addr);
            insns.push(insn);
            let next = addr.wrapping_add(2) & ADDRESS_MASK;
            let wrapped = next < addr;
            let off_the_end = (addr as usize) < end && next as usize >= end;
            if insn.is_terminator() || wrapped || off_the_end {
                break;
            }
            addr = next;
        }
        let len = 2 * insns.len() as u16;
        Block { start, insns, len }
    }

    /// The address of the first instruction
    pub fn start(&self) -> u16 {
        self.start
    }

    /// The address just past the last instruction
    pub fn end(&self) -> u16 {
        self.start.wrapping_add(self.len()) & ADDRESS_MASK
    }

    /// Length of the block, in bytes
    pub fn len(&self) -> u16 {
        self.len
    }

    /// Blocks always hold at least one instruction
    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// The instructions, in program order
    pub fn instructions(&self) -> &[Instruction] {
        &self.insns
    }
}

/// An [Engine] which executes a whole [Block] per tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blocks {
    cached: Cached,
    blocks: Vec<Option<Block>>,
}

impl Blocks {
    /// Builds the decode cache. Blocks are built as they're first visited.
    pub fn new(cpu: &CPU) -> Self {
        Blocks {
            cached: Cached::new(cpu),
            blocks: vec![None; ADDRESS_MASK as usize + 1],
        }
    }

    /// Gets the block which starts at `addr`, if it has been built
    pub fn block(&self, addr: u16) -> Option<&Block> {
        self.blocks.get(addr as usize)?.as_ref()
    }

    /// Counts the blocks built so far
    pub fn built(&self) -> usize {
        self.blocks.iter().flatten().count()
    }
}

impl Engine for Blocks {
    /// Executes the block at pc, building it first if this is its first visit
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x60, 0x01, // mov #01, v0
    ///     0x70, 0x01, // add #01, v0
    ///     0x12, 0x02, // jmp 202
    /// ]).unwrap();
    /// let mut blocks = Blocks::new(&cpu);
    /// assert_eq!(3, blocks.tick(&mut cpu).unwrap());
    /// assert_eq!(2, blocks.tick(&mut cpu).unwrap());
    /// assert_eq!(3, cpu.v()[0]);
    /// assert_eq!(5, cpu.cycle());
    /// ```
    fn tick(&mut self, cpu: &mut CPU) -> Result<usize> {
        let pc = cpu.pc();
        let Self { cached, blocks } = self;
        let block = blocks[pc as usize].get_or_insert_with(|| {
            let block = Block::build(cached, cpu, pc);
            log::debug!(
                "built block {pc:03x}..{:03x} ({} instructions)",
                block.end(),
                block.insns.len()
            );
            block
        });
        log::trace!("{pc:03x}: block of {}", block.insns.len());
        cpu.set_pc(block.end());
        for &instruction in &block.insns {
            cpu.execute(instruction)?;
            cpu.retire();
        }
        Ok(block.insns.len())
    }

    fn strategy(&self) -> Strategy {
        Strategy::Blocks
    }
}
