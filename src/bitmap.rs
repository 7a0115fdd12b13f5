// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! A fixed-size, bit-packed 2D buffer.
//!
//! Used for both the display and the keypad. Bits are stored row-major,
//! most-significant-bit first: pixel `(x, y)` lives in byte
//! `x / 8 + row_bytes * y`, at bit `7 - x % 8`.

use crate::error::{Error, Result};
use std::fmt::{Display, Formatter};

/// A bit-packed, row-major, MSB-first bitmap
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bitmap {
    width: usize,
    height: usize,
    bytes: Vec<u8>,
}

impl Bitmap {
    /// Constructs a new, blank bitmap.
    ///
    /// The width must be a nonzero multiple of 8, so that every row is a whole
    /// number of bytes.
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let screen = Bitmap::new(64, 32).unwrap();
    /// assert_eq!(256, screen.as_bytes().len());
    /// assert!(Bitmap::new(12, 4).is_err());
    /// ```
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 || width % 8 != 0 {
            return Err(Error::InvalidConfig {
                reason: format!("{width}x{height} is not a byte-aligned bitmap"),
            });
        }
        Ok(Self::blank(width, height))
    }

    /// Constructs a bitmap whose dimensions are already known to be valid
    pub(crate) fn blank(width: usize, height: usize) -> Self {
        debug_assert!(width % 8 == 0);
        Bitmap {
            width,
            height,
            bytes: vec![0; width * height / 8],
        }
    }

    /// Width, in bits
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height, in rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of bytes in one row
    pub fn row_bytes(&self) -> usize {
        self.width / 8
    }

    /// The packed backing buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline(always)]
    fn locate(&self, x: usize, y: usize) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((x / 8 + self.row_bytes() * y, 0x80 >> (x % 8)))
    }

    /// Gets the bit at `(x, y)`. Out-of-bounds bits read as unset.
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut keys = Bitmap::new(16, 1).unwrap();
    /// keys.set(0xa, 0, true);
    /// assert!(keys.get(0xa, 0));
    /// assert_eq!(&[0x00, 0x20], keys.as_bytes());
    /// ```
    pub fn get(&self, x: usize, y: usize) -> bool {
        match self.locate(x, y) {
            Some((byte, mask)) => self.bytes[byte] & mask != 0,
            None => false,
        }
    }

    /// Sets or clears the bit at `(x, y)`. Out-of-bounds writes are dropped.
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if let Some((byte, mask)) = self.locate(x, y) {
            if value {
                self.bytes[byte] |= mask;
            } else {
                self.bytes[byte] &= !mask;
            }
        }
    }

    /// Flips the bit at `(x, y)`, and returns its new value
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        match self.locate(x, y) {
            Some((byte, mask)) => {
                self.bytes[byte] ^= mask;
                self.bytes[byte] & mask != 0
            }
            None => false,
        }
    }

    /// Clears every bit
    pub fn clear(&mut self) {
        self.bytes.fill(0)
    }

    /// Returns true if any bit is set
    pub fn any(&self) -> bool {
        self.bytes.iter().any(|&byte| byte != 0)
    }

    /// Finds the lowest set bit, counting row-major from `(0, 0)`
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut keys = Bitmap::new(16, 1).unwrap();
    /// assert_eq!(None, keys.first_set());
    /// keys.set(0xc, 0, true);
    /// keys.set(0x3, 0, true);
    /// assert_eq!(Some(0x3), keys.first_set());
    /// ```
    pub fn first_set(&self) -> Option<usize> {
        (0..self.width * self.height).find(|&bit| self.get(bit % self.width, bit / self.width))
    }

    /// XORs `bits` into byte `index`, returning true if any set bit was cleared
    #[inline(always)]
    fn xor(&mut self, index: usize, bits: u8) -> bool {
        let old = self.bytes[index];
        self.bytes[index] = old ^ bits;
        old & bits != 0
    }

    /// XORs a one-byte-wide sprite onto the bitmap with its top-left corner at
    /// `(x, y)`, and reports whether any lit pixel was turned off.
    ///
    /// The origin always wraps around the edges. After that:
    /// - With `clip`, rows that fall off the bottom are dropped, and the part
    ///   of a row that falls off the right edge is dropped.
    /// - Without `clip`, rows wrap to the top and columns wrap to the left.
    /// # Examples
    /// ```rust
    /// # use trill::*;
    /// let mut screen = Bitmap::new(64, 32).unwrap();
    /// // Draw a line straddling the first two bytes
    /// assert!(!screen.blit(4, 0, &[0xff], true));
    /// assert_eq!(&[0x0f, 0xf0], &screen.as_bytes()[0..2]);
    /// // Drawing it again erases it, and collides
    /// assert!(screen.blit(4, 0, &[0xff], true));
    /// assert!(!screen.any());
    /// ```
    pub fn blit(&mut self, x: usize, y: usize, sprite: &[u8], clip: bool) -> bool {
        let (x, y) = (x % self.width, y % self.height);
        let rows = if clip {
            sprite.len().min(self.height - y)
        } else {
            sprite.len()
        };
        let row_bytes = self.row_bytes();
        let shift = x % 8;
        let (left, right) = (x / 8, (x / 8 + 1) % row_bytes);

        let mut collision = false;
        for (line, &byte) in sprite.iter().take(rows).enumerate() {
            let base = (y + line) % self.height * row_bytes;
            collision |= self.xor(base + left, byte >> shift);
            // The low bits of the sprite spill into the next byte over,
            // unless that byte wrapped around and we're clipping
            if shift != 0 && (!clip || right > left) {
                collision |= self.xor(base + right, byte << (8 - shift));
            }
        }
        collision
    }

    /// Renders the bitmap as text, using braille cells when `drawille` is enabled
    pub fn render(&self) -> String {
        #[cfg(feature = "drawille")]
        {
            use drawille::Canvas;
            let mut canvas = Canvas::new(self.width as u32, self.height as u32);
            (0..self.width * self.height)
                .filter(|&bit| self.get(bit % self.width, bit / self.width))
                .for_each(|bit| canvas.set((bit % self.width) as u32, (bit / self.width) as u32));
            canvas.frame()
        }
        #[cfg(not(feature = "drawille"))]
        self.to_string()
    }

    /// Prints the bitmap to stdout
    pub fn print_screen(&self) {
        println!("{}", self.render());
    }
}

impl Display for Bitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{}", if self.get(x, y) { '█' } else { ' ' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
