// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes the whole program once, then replays the decoded instructions
//!
//! The cache is never invalidated: programs which overwrite their own code
//! will keep running the instructions that were there when it was built.

use super::{Engine, Strategy};
use crate::{
    cpu::{instruction::Instruction, CPU},
    error::Result,
};

/// An [Engine] which looks instructions up in a table built at construction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cached {
    base: u16,
    cache: Vec<Instruction>,
}

impl Cached {
    /// Decodes every word from the CPU's start address to the end of memory
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let cpu = CPU::default();
    /// let cached = Cached::new(&cpu);
    /// // One instruction per word of program space
    /// assert_eq!((0x1000 - 0x200) / 2, cached.len());
    /// ```
    pub fn new(cpu: &CPU) -> Self {
        let base = cpu.config().start;
        let end = cpu.memory().len() as u16;
        let cache: Vec<_> = (base..end)
            .step_by(2)
            .map(|addr| Instruction::decode(cpu.fetch(addr)))
            .collect();
        log::debug!("decoded {} words at {base:03x}..{end:03x}", cache.len());
        Cached { base, cache }
    }

    /// Gets the number of cached instructions
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if nothing was cached
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Looks up the cached instruction at `addr`.
    ///
    /// Returns [None] for addresses below the start address, past the end of
    /// memory, or not word-aligned with the start address.
    pub fn lookup(&self, addr: u16) -> Option<Instruction> {
        let offset = addr.checked_sub(self.base)?;
        if offset % 2 != 0 {
            return None;
        }
        self.cache.get(offset as usize / 2).copied()
    }

    /// Gets the instruction at `addr`, decoding it from memory if it isn't cached
    #[inline(always)]
    pub fn get(&self, cpu: &CPU, addr: u16) -> Instruction {
        self.lookup(addr)
            .unwrap_or_else(|| Instruction::decode(cpu.fetch(addr)))
    }
}

impl Engine for Cached {
    fn tick(&mut self, cpu: &mut CPU) -> Result<usize> {
        let pc = cpu.pc();
        let instruction = self.get(cpu, pc);
        log::trace!("{pc:03x}: {instruction}");
        cpu.advance();
        cpu.execute(instruction)?;
        cpu.retire();
        Ok(1)
    }

    fn strategy(&self) -> Strategy {
        Strategy::Cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::instruction::Insn;

    #[test]
    fn lookup() {
        let mut cpu = CPU::default();
        cpu.load_program_bytes(&[0x00, 0xe0, 0x12, 0x00]).unwrap();
        let cached = Cached::new(&cpu);
        assert_eq!(Some(Insn::cls), cached.lookup(0x200).unwrap().insn());
        assert_eq!(Some(Insn::jmp { A: 0x200 }), cached.lookup(0x202).unwrap().insn());
        // Zeroed memory decodes to the no-op
        assert_eq!(None, cached.lookup(0x204).unwrap().insn());
        // Unaligned and out-of-range addresses miss
        assert_eq!(None, cached.lookup(0x201));
        assert_eq!(None, cached.lookup(0x1fe));
        assert_eq!(None, cached.lookup(0x1000));
    }

    #[test]
    fn get_decodes_misses() {
        let mut cpu = CPU::default();
        cpu.load_program_bytes(&[0x00, 0x00, 0xe0]).unwrap();
        let cached = Cached::new(&cpu);
        // 0x201 is unaligned, so it's decoded straight from memory
        assert_eq!(Some(Insn::cls), cached.get(&cpu, 0x201).insn());
        // The font isn't cached either
        assert_eq!(0xf090, cached.get(&cpu, 0x000).word());
    }

    #[test]
    fn stale_after_self_modification() {
        let mut cpu = CPU::default();
        cpu.load_program_bytes(&[0x00, 0xe0]).unwrap();
        let cached = Cached::new(&cpu);
        cpu.write(0x200, 0x12);
        assert_eq!(0x00e0, cached.get(&cpu, 0x200).word());
    }
}
