// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Feeds terminal key events into the Chip-8 keypad
//!
//! The left hand of a QWERTY keyboard stands in for the hex keypad:
//! ```text
//! 1 2 3 4      1 2 3 C
//! Q W E R  ->  4 5 6 D
//! A S D F      7 8 9 E
//! Z X C V      A 0 B F
//! ```

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal,
};
use std::time::{Duration, Instant};
use trill::*;

/// How long a key stays down when the terminal never reports its release
pub const HOLD: Duration = Duration::from_millis(250);

/// Maps a terminal key to a Chip-8 key
pub fn map_key(code: KeyCode) -> Option<usize> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    Some(match c.to_ascii_lowercase() {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xc,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xd,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xe,
        'z' => 0xa,
        'x' => 0x0,
        'c' => 0xb,
        'v' => 0xf,
        _ => return None,
    })
}

/// What the front end should do after an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Tracks which keys are held, releasing them after [HOLD]
#[derive(Clone, Debug)]
pub struct Keypad {
    held: [Option<Instant>; 16],
    hold: Duration,
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new(HOLD)
    }
}

impl Keypad {
    pub fn new(hold: Duration) -> Self {
        Keypad {
            held: [None; 16],
            hold,
        }
    }

    /// Applies one key event to the CPU
    pub fn handle(&mut self, cpu: &mut CPU, key: KeyEvent, now: Instant) -> Result<Action> {
        if key.code == KeyCode::Esc {
            return Ok(Action::Quit);
        }
        let Some(k) = map_key(key.code) else {
            return Ok(Action::Continue);
        };
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if self.held[k].replace(now).is_none() {
                    log::trace!("key {k:x} down");
                    cpu.press(k)?;
                }
            }
            KeyEventKind::Release => {
                if self.held[k].take().is_some() {
                    log::trace!("key {k:x} up");
                    cpu.release(k)?;
                }
            }
        }
        Ok(Action::Continue)
    }

    /// Releases every key held longer than the hold time
    pub fn expire(&mut self, cpu: &mut CPU, now: Instant) -> Result<()> {
        for k in 0..self.held.len() {
            match self.held[k] {
                Some(since) if now.duration_since(since) >= self.hold => {
                    self.held[k] = None;
                    log::trace!("key {k:x} up");
                    cpu.release(k)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Drains pending terminal events without blocking
    pub fn poll(&mut self, cpu: &mut CPU) -> Result<Action> {
        let now = Instant::now();
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if self.handle(cpu, key, now)? == Action::Quit {
                    return Ok(Action::Quit);
                }
            }
        }
        self.expire(cpu, now)?;
        Ok(Action::Continue)
    }
}

/// Holds the terminal in raw mode until dropped
#[derive(Debug)]
pub struct RawMode;

impl RawMode {
    pub fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("could not restore the terminal: {e}");
        }
    }
}
