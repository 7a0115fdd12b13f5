// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Holds the machine state, and runs instructions against it

#[cfg(test)]
mod tests;

pub mod behavior;
pub mod clock;
pub mod config;
pub mod flags;
pub mod instruction;
pub mod mode;
pub mod quirks;

use self::{clock::Clock, config::Config, flags::Flags, quirks::Quirks};
use crate::{
    bitmap::Bitmap,
    error::{Error, Result},
};
use owo_colors::OwoColorize;
use rand::{rngs::StdRng, SeedableRng};
use std::fmt::Debug;

type Reg = usize;
type Adr = u16;
type Nib = u8;

/// Every address is 12 bits wide
pub const ADDRESS_MASK: Adr = 0x0fff;
/// Width of the display, in pixels
pub const SCREEN_WIDTH: usize = 64;
/// Height of the display, in pixels
pub const SCREEN_HEIGHT: usize = 32;
/// Number of keys on the keypad
pub const KEY_COUNT: usize = 16;

/// The hexadecimal font, loaded at address `0x000`
pub const FONT: [u8; 80] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

/// Represents the internal state of the CPU interpreter
#[derive(Clone)]
pub struct CPU {
    config: Config,
    /// Latches which aren't inherent to the chip-8
    flags: Flags,
    // memory
    memory: Vec<u8>,
    stack: Vec<Adr>,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    delay: u8,
    sound: u8,
    // I/O
    screen: Bitmap,
    keys: Bitmap,
    // Execution data
    clock: Clock,
    cycle: usize,
    rng: StdRng,
}

// public interface
impl CPU {
    /// Constructs a new CPU, taking all configurable parameters
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let cpu = CPU::new(Config {
    ///     start: 0x600,
    ///     ..Default::default()
    /// })
    /// .unwrap();
    /// assert_eq!(0x600, cpu.pc());
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let mut memory = vec![0; config.memory_size];
        memory[..FONT.len()].copy_from_slice(&FONT);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        CPU {
            flags: Flags::new(),
            memory,
            stack: vec![],
            pc: config.start,
            i: 0,
            v: [0; 16],
            delay: 0,
            sound: 0,
            screen: Bitmap::blank(SCREEN_WIDTH, SCREEN_HEIGHT),
            keys: Bitmap::blank(KEY_COUNT, 1),
            clock: Clock::new(config.ratio),
            cycle: 0,
            rng,
            config,
        }
    }

    /// Loads a program into the CPU's program space
    pub fn load_program(&mut self, rom: impl AsRef<std::path::Path>) -> Result<&mut Self> {
        self.load_program_bytes(&std::fs::read(rom)?)
    }

    /// Loads bytes into the CPU's program space, clearing whatever was there
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[0x00, 0xe0]).unwrap();
    /// assert_eq!(0x00e0, cpu.fetch(0x200));
    /// // There's only 0xe00 bytes of program space
    /// assert!(cpu.load_program_bytes(&[0; 0xe01]).is_err());
    /// ```
    pub fn load_program_bytes(&mut self, rom: &[u8]) -> Result<&mut Self> {
        let start = self.config.start as usize;
        let program = &mut self.memory[start..];
        if rom.len() > program.len() {
            return Err(Error::RomTooLarge {
                len: rom.len(),
                room: program.len(),
                start: self.config.start,
            });
        }
        program.fill(0);
        program[..rom.len()].copy_from_slice(rom);
        Ok(self)
    }

    /// Presses a key, and reports whether the key's state changed.
    /// If key does not exist, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    ///
    /// // press key `7`
    /// let did_press = cpu.press(0x7).unwrap();
    /// assert!(did_press);
    ///
    /// // press key `7` again, even though it's already pressed
    /// let did_press = cpu.press(0x7).unwrap();
    /// // it was already pressed, so nothing's changed.
    /// assert!(!did_press);
    /// ```
    pub fn press(&mut self, key: usize) -> Result<bool> {
        self.set_key(key, true)
    }

    /// Releases a key, and reports whether the key's state changed.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// // press key `7`
    /// cpu.press(0x7).unwrap();
    /// // release key `7`
    /// let changed = cpu.release(0x7).unwrap();
    /// assert!(changed); // key released
    /// // try releasing `7` again
    /// let changed = cpu.release(0x7).unwrap();
    /// assert!(!changed); // key was not held
    /// ```
    pub fn release(&mut self, key: usize) -> Result<bool> {
        self.set_key(key, false)
    }

    fn set_key(&mut self, key: usize, down: bool) -> Result<bool> {
        if key >= KEY_COUNT {
            return Err(Error::InvalidKey { key });
        }
        let changed = self.keys.get(key, 0) != down;
        self.keys.set(key, 0, down);
        Ok(changed)
    }

    /// Gets the keypad, one bit per key
    pub fn keys(&self) -> &Bitmap {
        &self.keys
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// // Create a new CPU, and set v4 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert_eq!(0x41, cpu.v()[4]);
    /// assert!(cpu.set_v(0x10, 0).is_err());
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        if let Some(gpr) = self.v.get_mut(reg) {
            *gpr = value;
            Ok(())
        } else {
            Err(Error::InvalidRegister { reg })
        }
    }

    /// Gets a slice of the entire general purpose registers
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(0x200, cpu.pc());
    /// ```
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Sets the program counter, masked to 12 bits
    pub fn set_pc(&mut self, pc: Adr) {
        self.pc = pc & ADDRESS_MASK;
    }

    /// Gets the I register
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Gets the call stack, most recent return address last
    pub fn stack(&self) -> &[Adr] {
        &self.stack
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.sound
    }

    /// Returns true while the sound timer is running
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// assert!(!cpu.beeping());
    /// ```
    pub fn beeping(&self) -> bool {
        self.sound != 0
    }

    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// Gets the number of instructions the CPU has retired
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Gets the display
    pub fn screen(&self) -> &Bitmap {
        &self.screen
    }

    /// Returns true if the display changed since the dirty flag was last taken
    pub fn is_dirty(&self) -> bool {
        self.flags.dirty
    }

    /// Clears the dirty flag, returning its previous value
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// // Fresh machines have a blank first frame to show
    /// assert!(cpu.take_dirty());
    /// assert!(!cpu.take_dirty());
    /// ```
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.flags.dirty)
    }

    /// Gets the runtime latches
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Gets the [Quirks] this CPU was built with
    pub fn quirks(&self) -> &Quirks {
        &self.config.quirks
    }

    /// Gets the [Config] this CPU was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the entirety of memory
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Reads a byte. Addresses wrap at 12 bits; bytes past the end of memory read as 0.
    #[inline(always)]
    pub fn read(&self, addr: Adr) -> u8 {
        self.memory
            .get((addr & ADDRESS_MASK) as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Writes a byte. Addresses wrap at 12 bits; bytes past the end of memory are dropped.
    #[inline(always)]
    pub fn write(&mut self, addr: Adr, value: u8) {
        if let Some(byte) = self.memory.get_mut((addr & ADDRESS_MASK) as usize) {
            *byte = value;
        }
    }

    /// Fetches the big-endian opcode word at `addr`
    #[inline(always)]
    pub fn fetch(&self, addr: Adr) -> u16 {
        u16::from_be_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Counts one retired instruction against the timer cadence.
    ///
    /// Every [Config::ratio] instructions, both timers count down by one and
    /// the display-wait latch is released.
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// for _ in 0..cpu.config().ratio {
    ///     cpu.retire();
    /// }
    /// assert_eq!(cpu.config().ratio, cpu.cycle());
    /// ```
    #[inline(always)]
    pub fn retire(&mut self) {
        self.cycle += 1;
        if self.clock.step() {
            self.delay = self.delay.saturating_sub(1);
            self.sound = self.sound.saturating_sub(1);
            self.flags.draw_wait = false;
        }
    }

    /// Resets the emulator.
    ///
    /// Touches the [Flags], stack, pc, registers, timers, screen, keys, and cycle count.
    ///
    /// Does not touch memory or the [Config].
    pub fn reset(&mut self) {
        self.flags = Flags::new();
        // clear the stack
        self.stack.truncate(0);
        // Reset the program counter
        self.pc = self.config.start;
        // Zero the registers
        self.i = 0;
        self.v = [0; 16];
        self.delay = 0;
        self.sound = 0;
        // I/O
        self.screen.clear();
        self.keys.clear();
        // Execution data
        self.clock.reset();
        self.cycle = 0;
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 0000, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// DLY: 0, SND: 0, CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {:04x}, I: {:04x}\n{}DLY: {}, SND: {}, CYC: {:6}",
            self.pc,
            self.stack.len(),
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.delay,
            self.sound,
            self.cycle.bright_black(),
        );
    }
}

/// Compares the architectural state: everything but the random number generator
impl PartialEq for CPU {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
            && self.flags == other.flags
            && self.memory == other.memory
            && self.stack == other.stack
            && self.pc == other.pc
            && self.i == other.i
            && self.v == other.v
            && self.delay == other.delay
            && self.sound == other.sound
            && self.screen == other.screen
            && self.keys == other.keys
            && self.clock == other.clock
            && self.cycle == other.cycle
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("config", &self.config)
            .field("flags", &self.flags)
            .field("stack", &self.stack)
            .field("pc", &self.pc)
            .field("i", &self.i)
            .field("v", &self.v)
            .field("delay", &self.delay)
            .field("sound", &self.sound)
            .field("keys", &self.keys)
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    /// Constructs a new CPU with the default [Config]
    ///
    /// # Examples
    /// ```rust
    /// use trill::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(&FONT, &cpu.memory()[0..80]);
    /// ```
    fn default() -> Self {
        Self::build(Config::default())
    }
}
