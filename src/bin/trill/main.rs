// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Trill: a terminal front end for the Trill Chip-8 virtual machine


mod keypad;

use crossterm::{cursor, style::Print, terminal, QueueableCommand};
use gumdrop::Options;
use keypad::{Action, Keypad, RawMode};
use owo_colors::OwoColorize;
use std::{
    io::Write,
    path::PathBuf,
    process::ExitCode,
    time::{Duration, Instant},
};
use trill::*;

pub fn main() -> ExitCode {
    env_logger::init();
    let options = Arguments::parse_args_default_or_exit();
    let dump = options.dump;
    let mut state = match State::new(options) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{}", e.bold().red());
            return ExitCode::FAILURE;
        }
    };
    let result = state.run();
    if dump {
        state.ch8.cpu.dump();
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{}", e.bold().red());
            ExitCode::FAILURE
        }
    }
}

/// Parses a hexadecimal string into a u16
fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value.trim_start_matches("0x"), 16)
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Load a ROM to run on Trill.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,

    #[options(
        short = "e",
        help = "Select the execution engine (interpreter, cached, blocks).",
        meta = "ENGINE"
    )]
    pub strategy: Option<Strategy>,
    #[options(help = "Run in (Chip8, SChip, XOChip) mode.")]
    pub mode: Option<Mode>,

    #[options(
        short = "z",
        help = "Toggle setting vF to 0 after a bitwise operation."
    )]
    pub vfreset: bool,
    #[options(
        short = "x",
        help = "Toggle waiting for vblank after issuing a draw call."
    )]
    pub drawsync: bool,
    #[options(
        short = "c",
        help = "Toggle COSMAC style DMA instructions, which leave I past the last register."
    )]
    pub memory: bool,
    #[options(
        short = "w",
        help = "Toggle clipping sprites at the edge of the screen, instead of wrapping."
    )]
    pub clip: bool,
    #[options(
        short = "v",
        help = "Toggle CHIP-48 style bit-shifts, which don't touch vY."
    )]
    pub shift: bool,
    #[options(
        short = "b",
        help = "Toggle SUPER-CHIP style indexed jump, which is indexed relative to v[adr]."
    )]
    pub jumping: bool,

    #[options(
        help = "Set the load address and entry point.",
        parse(try_from_str = "parse_hex"),
        meta = "ADR"
    )]
    pub start: Option<u16>,
    #[options(help = "Set the instructions-per-frame ratio.", default = "10", meta = "R")]
    pub ratio: usize,
    #[options(
        help = "Set the instructions-per-second rate. 0 runs as fast as possible.",
        default = "600",
        meta = "HZ"
    )]
    pub rate: u64,
    #[options(short = "n", help = "Stop after this many instructions.", meta = "N")]
    pub cycles: Option<usize>,
    #[options(
        short = "l",
        help = "Halt when the call stack grows deeper than this.",
        meta = "DEPTH"
    )]
    pub stack_limit: Option<usize>,
    #[options(help = "Seed the random number generator.", meta = "SEED")]
    pub seed: Option<u64>,

    #[options(help = "Print the screen whenever it changes.")]
    pub show: bool,
    #[options(
        short = "i",
        help = "Read the keypad from the keyboard (1234/QWER/ASDF/ZXCV). Esc quits."
    )]
    pub interactive: bool,
    #[options(help = "Dump the registers on exit.")]
    pub dump: bool,
}

impl Arguments {
    /// Builds the CPU [Config], flipping each requested quirk
    fn config(&self) -> Config {
        let mut quirks: Quirks = self.mode.unwrap_or_default().into();
        quirks.vf_reset ^= self.vfreset;
        quirks.display_wait ^= self.drawsync;
        quirks.memory_increment ^= self.memory;
        quirks.clipping ^= self.clip;
        quirks.shifting ^= self.shift;
        quirks.jumping ^= self.jumping;
        Config {
            start: self.start.unwrap_or(0x200),
            ratio: self.ratio,
            quirks,
            seed: self.seed,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct State {
    pub ch8: Chip8,
    pub rate: u64,
    pub cycles: Option<usize>,
    pub show: bool,
    pub keypad: Option<Keypad>,
    pub beeper: Beeper,
    pub ft: Instant,
}

impl State {
    fn new(options: Arguments) -> Result<Self> {
        let mut cpu = CPU::new(options.config())?;
        cpu.load_program(&options.file)?;
        let strategy = options.strategy.unwrap_or_default();
        log::info!(
            "loaded {} with the {strategy} engine, {:?}",
            options.file.display(),
            cpu.quirks()
        );
        Ok(State {
            ch8: Chip8::new(cpu, strategy).with_stack_limit(options.stack_limit),
            rate: options.rate,
            cycles: options.cycles,
            show: options.show,
            keypad: options.interactive.then(Keypad::default),
            beeper: Beeper::default(),
            ft: Instant::now(),
        })
    }

    /// Runs until the cycle limit is reached, the user quits, or the program fails
    fn run(&mut self) -> Result<()> {
        let _raw = match self.keypad {
            Some(_) => Some(RawMode::enable()?),
            None => None,
        };
        while self.cycles.map_or(true, |limit| self.ch8.cpu.cycle() < limit) {
            if let Some(keypad) = &mut self.keypad {
                if keypad.poll(&mut self.ch8.cpu)? == Action::Quit {
                    log::info!("quit at {:03x}", self.ch8.cpu.pc());
                    break;
                }
            }
            let retired = self.ch8.tick()?;
            if self.show && self.ch8.cpu.take_dirty() {
                self.draw()?;
            }
            if let Some(beeping) = self.beeper.update(self.ch8.cpu.beeping()) {
                self.beep(beeping)?;
            }
            self.wait_for_next_tick(retired);
        }
        log::info!("stopped after {} instructions", self.ch8.cpu.cycle());
        Ok(())
    }

    /// Prints the screen, redrawing in place when the terminal is in raw mode
    fn draw(&self) -> Result<()> {
        let screen = self.ch8.cpu.screen();
        if self.keypad.is_none() {
            screen.print_screen();
            return Ok(());
        }
        let mut out = std::io::stdout();
        out.queue(cursor::MoveTo(0, 0))?
            .queue(terminal::Clear(terminal::ClearType::All))?
            .queue(Print(screen.render().replace('\n', "\r\n")))?;
        out.flush()?;
        Ok(())
    }

    /// Reports the start and end of a tone
    fn beep(&self, beeping: bool) -> Result<()> {
        if !beeping {
            log::info!("beep off at {:03x}", self.ch8.cpu.pc());
            return Ok(());
        }
        log::info!("beep on at {:03x}", self.ch8.cpu.pc());
        if self.keypad.is_some() {
            let mut out = std::io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        Ok(())
    }

    /// Paces execution at `rate` instructions per second
    fn wait_for_next_tick(&mut self, retired: usize) {
        if self.rate == 0 {
            return;
        }
        let rate = Duration::from_nanos(retired as u64 * 1_000_000_000 / self.rate);
        std::thread::sleep(rate.saturating_sub(self.ft.elapsed()));
        self.ft += rate;
    }
}

/// Watches the sound timer for the edges of a tone
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Beeper {
    beeping: bool,
}

impl Beeper {
    /// Returns the new state when the tone starts or stops
    fn update(&mut self, beeping: bool) -> Option<bool> {
        if self.beeping == beeping {
            return None;
        }
        self.beeping = beeping;
        Some(beeping)
    }
}
