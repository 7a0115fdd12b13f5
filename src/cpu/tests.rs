// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Unit tests for [super::CPU]
//!
//! These run instructions, and ensure their output is consistent with previous builds
//!
//! General test format:
//! 1. Prepare to do the thing
//! 2. Do the thing
//! 3. Compare the result to the expected result

use super::{mode::Mode, *};
use rand::random;


fn setup_environment() -> CPU {
    let mut cpu = CPU::new(Config {
        seed: Some(0xc8),
        ..Default::default()
    })
    .unwrap();
    cpu.load_program_bytes(&[
        0x00, 0xe0, // cls
        0x12, 0x02, // jmp 202
    ])
    .unwrap();
    cpu
}

fn with_quirks(quirks: Quirks) -> CPU {
    let mut cpu = setup_environment();
    cpu.config.quirks = quirks;
    cpu
}

mod sys {
    use super::*;
    /// 00e0: Clears the screen memory to 0
    #[test]
    fn clear_screen() {
        let mut cpu = setup_environment();
        cpu.screen.blit(0, 0, &[0xff; 32], false);
        cpu.flags.dirty = false;
        cpu.clear_screen();
        assert!(!cpu.screen.any());
        assert!(cpu.flags.dirty);
    }

    /// 00ee: Returns from subroutine
    #[test]
    fn ret() {
        let test_addr = random::<u16>() & 0x7fe;
        let mut cpu = setup_environment();
        // Place the address on the stack
        cpu.stack.push(test_addr);

        cpu.ret().unwrap();

        // Verify the current address is the address from the stack
        assert_eq!(test_addr, cpu.pc);
        assert!(cpu.stack.is_empty());
    }

    /// 00ee with nothing to return to
    #[test]
    fn ret_underflow() {
        let mut cpu = setup_environment();
        cpu.pc = 0x346;
        assert!(matches!(
            cpu.ret(),
            Err(Error::StackUnderflow { addr: 0x344 })
        ));
    }
}

/// Tests control-flow instructions
///
/// Basically anything that touches the program counter
mod cf {
    use super::*;
    /// 1aaa: Sets the program counter to an absolute address
    #[test]
    fn jump() {
        let mut cpu = setup_environment();
        // Test all valid addresses
        for addr in 0x000..0x1000 {
            // Jump to an address
            cpu.jump(addr);
            // Verify the current address is the jump target address
            assert_eq!(addr, cpu.pc);
        }
    }

    /// 2aaa: Pushes pc onto the stack, then jumps to a
    #[test]
    fn call() {
        let test_addr = random::<u16>() & ADDRESS_MASK;
        let mut cpu = setup_environment();
        // Save the current address
        let curr_addr = cpu.pc;
        // Call an address
        cpu.call(test_addr);
        // Verify the current address is the called address
        assert_eq!(test_addr, cpu.pc);
        // Verify the previous address was stored on the stack
        let stack_addr: u16 = cpu.stack.pop().expect("This should return curr_addr");
        assert_eq!(stack_addr, curr_addr);
    }

    /// 3xbb: Skips the next instruction if register X == b
    #[test]
    fn skip_equals_immediate() {
        let mut cpu = setup_environment();
        for word in 0..=0xffff {
            let (a, b, addr) = (word as u8, (word >> 8) as u8, random::<u16>() & 0x7fe);
            let x = word as usize & 0xf;
            // set the PC to a random address
            cpu.pc = addr;

            cpu.v[x] = a;

            cpu.skip_equals_immediate(x, b);

            assert_eq!(cpu.pc, addr.wrapping_add(if a == b { 2 } else { 0 }));
        }
    }

    /// 4xbb: Skips the next instruction if register X != b
    #[test]
    fn skip_not_equals_immediate() {
        let mut cpu = setup_environment();
        for word in 0..=0xffff {
            let (a, b, addr) = (word as u8, (word >> 8) as u8, random::<u16>() & 0x7fe);
            let x = word as usize & 0xf;
            cpu.pc = addr;

            cpu.v[x] = a;

            cpu.skip_not_equals_immediate(x, b);

            assert_eq!(cpu.pc, addr.wrapping_add(if a != b { 2 } else { 0 }));
        }
    }

    /// 5xy0: Skips the next instruction if register X == register Y
    #[test]
    fn skip_equals() {
        let mut cpu = setup_environment();
        for word in 0..=0xfff {
            let (a, b, addr) = (word as u8, (word >> 4) as u8, random::<u16>() & 0x7fe);
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                if x == y {
                    continue;
                }
                cpu.pc = addr;

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.skip_equals(x, y);

                assert_eq!(cpu.pc, addr.wrapping_add(if a == b { 2 } else { 0 }));
            }
        }
    }

    /// 9xy0: Skip next instruction if X != y
    #[test]
    fn skip_not_equals() {
        let mut cpu = setup_environment();
        for word in 0..=0xfff {
            let (a, b, addr) = (word as u8, (word >> 4) as u8, random::<u16>() & 0x7fe);
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                if x == y {
                    continue;
                }
                cpu.pc = addr;

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.skip_not_equals(x, y);

                assert_eq!(cpu.pc, addr.wrapping_add(if a != b { 2 } else { 0 }));
            }
        }
    }

    /// Skips at the top of memory wrap around to the bottom
    #[test]
    fn skip_wraps() {
        let mut cpu = setup_environment();
        cpu.pc = 0xffe;
        cpu.v[3] = 0x12;
        cpu.skip_equals_immediate(3, 0x12);
        assert_eq!(0x000, cpu.pc);
    }

    /// Badr: Jump to &adr + v0
    #[test]
    fn jump_indexed() {
        let mut cpu = with_quirks(Mode::Chip8.into());
        // For every valid address
        for addr in 0..0x1000 {
            // For every valid offset
            for v0 in 0..=0xff {
                cpu.v[0] = v0;

                cpu.jump_indexed(addr);

                assert_eq!(cpu.pc, addr.wrapping_add(v0.into()) & ADDRESS_MASK);
            }
        }
    }

    /// Tests `jumping` Quirk behavior
    #[test]
    fn jump_indexed_quirk() {
        let mut cpu = with_quirks(Mode::SChip.into());
        //set v[0..F] to 0123456789abcdef
        for i in 0..0x10 {
            cpu.v[i] = i as u8;
        }
        for reg in 0..0x10 {
            // attempts to jump to 0x`reg`00 + v0
            cpu.jump_indexed(reg * 0x100);
            // jumps to 0x`reg`00 + v`reg` instead
            assert_eq!(cpu.pc, reg * 0x101);
        }
    }
}

mod math {
    use super::*;
    /// 6xbb: Loads immediate byte b into register vX
    #[test]
    fn load_immediate() {
        let mut cpu = setup_environment();
        for test_register in 0x0..=0xf {
            for test_byte in 0x0..=0xff {
                cpu.load_immediate(test_register, test_byte);
                assert_eq!(cpu.v[test_register], test_byte)
            }
        }
    }

    /// 7xbb: Adds immediate byte b to register vX
    #[test]
    fn add_immediate() {
        let mut cpu = setup_environment();
        for test_register in 0x0..=0xf {
            let mut sum = 0u8;
            cpu.v[0xf] = 0xc5; // sentinel
            for test_byte in 0x0..=0xff {
                // Note: Chip-8 allows unsigned overflow
                sum = sum.wrapping_add(test_byte);

                cpu.add_immediate(test_register, test_byte);

                assert_eq!(cpu.v[test_register], sum);
            }
            if test_register != 0xf {
                // 7xbb never touches the flag
                assert_eq!(0xc5, cpu.v[0xf]);
            }
            cpu.v[test_register] = 0;
        }
    }

    /// 8xy0: Loads the value of y into x
    #[test]
    fn load() {
        let mut cpu = setup_environment();
        // We use zero as a sentinel value for this test, so loop from 1 to 255
        for test_value in 1..=0xff {
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                if x == y {
                    continue;
                }
                cpu.v[y] = test_value;
                cpu.v[x] = 0;

                cpu.load(x, y);

                assert_eq!(cpu.v[x], test_value);
                assert_eq!(cpu.v[y], test_value);
            }
        }
    }

    /// Runs a bitwise operation over a spread of operands, with and without vf_reset
    fn bitwise(op: fn(&mut CPU, Reg, Reg), expect: fn(u8, u8) -> u8) {
        for vf_reset in [true, false] {
            let mut cpu = with_quirks(Quirks {
                vf_reset,
                ..Default::default()
            });
            for word in (0..=0xffff).step_by(7) {
                let (a, b) = (word as u8, (word >> 8) as u8);
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);
                    if x == 0xf || y == 0xf {
                        continue;
                    }
                    cpu.v[0xf] = 0xc5; // sentinel
                    (cpu.v[x], cpu.v[y]) = (a, b);

                    op(&mut cpu, x, y);

                    let a = if x == y { b } else { a };
                    assert_eq!(cpu.v[x], expect(a, b));
                    assert_eq!(cpu.v[0xf], if vf_reset { 0 } else { 0xc5 });
                }
            }
        }
    }

    /// 8xy1: Performs bitwise or of vX and vY, and stores the result in vX
    #[test]
    fn or() {
        bitwise(CPU::or, |a, b| a | b);
    }

    /// 8xy2: Performs bitwise and of vX and vY, and stores the result in vX
    #[test]
    fn and() {
        bitwise(CPU::and, |a, b| a & b);
    }

    /// 8xy3: Performs bitwise xor of vX and vY, and stores the result in vX
    #[test]
    fn xor() {
        bitwise(CPU::xor, |a, b| a ^ b);
    }

    /// 8xy4: Performs addition of vX and vY, and stores the result in vX, carry in vF
    ///       If X is F, *only* stores carry
    #[test]
    fn add() {
        let mut cpu = setup_environment();
        for word in 0..=0xffff {
            let (a, b) = (word as u8, (word >> 8) as u8);
            for reg in (0..=0xff).step_by(17) {
                let (x, y) = (reg & 0xf, reg >> 4);
                // If x == y, a is discarded
                let (expected, carry) = if x == y { b } else { a }.overflowing_add(b);

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.add(x, y);

                // if the destination is vF, the result was discarded, and only the carry was kept
                if x != 0xf {
                    assert_eq!(cpu.v[x], expected);
                }
                assert_eq!(cpu.v[0xf], carry.into());
            }
        }
    }

    /// 0xff + 0x01 overflows to 0, with carry
    #[test]
    fn add_overflow() {
        let mut cpu = setup_environment();
        (cpu.v[1], cpu.v[2]) = (0xff, 0x01);
        cpu.add(1, 2);
        assert_eq!((0x00, 1), (cpu.v[1], cpu.v[0xf]));
    }

    /// The flag is written last, even when vF is the destination
    #[test]
    fn flag_wins() {
        let mut cpu = setup_environment();
        (cpu.v[0xf], cpu.v[1]) = (0x10, 0x20);
        cpu.add(0xf, 1);
        assert_eq!(0, cpu.v[0xf]);
        (cpu.v[0xf], cpu.v[1]) = (0x10, 0x20);
        cpu.sub(0xf, 1);
        assert_eq!(0, cpu.v[0xf]);
    }

    /// 8xy5: Performs subtraction of vX and vY, and stores the result in vX, !borrow in vF
    #[test]
    fn sub() {
        let mut cpu = setup_environment();
        for word in 0..=0xffff {
            let (a, b) = (word as u8, (word >> 8) as u8);
            for reg in (0..=0xff).step_by(17) {
                let (x, y) = (reg & 0xf, reg >> 4);
                let (expected, borrow) = if x == y { b } else { a }.overflowing_sub(b);

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.sub(x, y);

                if x != 0xf {
                    assert_eq!(cpu.v[x], expected);
                }
                // The borrow flag for subtraction is inverted
                assert_eq!(cpu.v[0xf], (!borrow).into());
            }
        }
    }

    /// 1 - 2 borrows
    #[test]
    fn sub_underflow() {
        let mut cpu = setup_environment();
        (cpu.v[1], cpu.v[2]) = (1, 2);
        cpu.sub(1, 2);
        assert_eq!((0xff, 0), (cpu.v[1], cpu.v[0xf]));
    }

    /// 8xy7: Performs subtraction of vY and vX, and stores the result in vX and !borrow in vF
    #[test]
    fn backwards_sub() {
        let mut cpu = setup_environment();
        for word in 0..=0xffff {
            let (a, b) = (word as u8, (word >> 8) as u8);
            for reg in (0..=0xff).step_by(17) {
                let (x, y) = (reg & 0xf, reg >> 4);
                let (expected, borrow) = if x == y { a } else { b }.overflowing_sub(a);
                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.backwards_sub(x, y);

                if x != 0xf {
                    assert_eq!(cpu.v[x], expected);
                }
                assert_eq!(cpu.v[0xf], (!borrow).into());
            }
        }
    }

    mod shift_right {
        use super::*;
        /// 8xy6: Performs bitwise right shift of vY into vX, stores carry-out in vF
        #[test]
        fn shift_right() {
            let mut cpu = with_quirks(Mode::Chip8.into());
            for word in 0..=0xff {
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);
                    (cpu.v[x], cpu.v[y]) = (0, word);

                    cpu.shift_right(x, y);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], word >> 1);
                    }
                    assert_eq!(cpu.v[0xf], word & 1);
                }
            }
        }
        /// The same test, with the `shifting` quirk set
        #[test]
        fn shift_right_quirk() {
            let mut cpu = with_quirks(Mode::SChip.into());
            for word in 0..=0xff {
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);
                    cpu.v[x] = word;

                    cpu.shift_right(x, y);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], word >> 1);
                    }
                    assert_eq!(cpu.v[0xf], word & 1);
                }
            }
        }
    }

    mod shift_left {
        use super::*;
        /// 8xyE: Performs bitwise left shift of vY into vX, stores carry-out in vF
        #[test]
        fn shift_left() {
            let mut cpu = with_quirks(Mode::Chip8.into());
            for word in 1..=0xff {
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);
                    (cpu.v[x], cpu.v[y]) = (0, word);

                    cpu.shift_left(x, y);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], word << 1);
                    }
                    assert_eq!(cpu.v[0xf], word >> 7);
                }
            }
        }

        /// The same test, with the `shifting` quirk set
        #[test]
        fn shift_left_quirk() {
            let mut cpu = with_quirks(Mode::SChip.into());
            for word in 0..=0xff {
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);
                    cpu.v[x] = word;

                    cpu.shift_left(x, y);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], word << 1);
                    }
                    assert_eq!(cpu.v[0xf], word >> 7);
                }
            }
        }
    }
}

/// Test operations on the index/indirect register, I
mod i {
    use super::*;
    /// Aadr: Load address #adr into register I
    #[test]
    fn load_i_immediate() {
        let mut cpu = setup_environment();
        for addr in 0..0x1000 {
            cpu.load_i_immediate(addr);
            assert_eq!(cpu.i, addr);
        }
    }

    /// Fx1e: Add vX to I
    #[test]
    fn add_i() {
        let mut cpu = setup_environment();
        // For every valid address
        for addr in 0..0x1000 {
            // For a spread of offsets
            for x in (0..=0xfff).step_by(0x33) {
                let (x, byte) = (x >> 8, x as u8);
                (cpu.i, cpu.v[x]) = (addr as u16, byte);

                cpu.add_i(x);

                // I stays within the address space
                assert_eq!(cpu.i, (addr + byte as usize) as u16 & ADDRESS_MASK)
            }
        }
    }
}

/// Screen, buttons, other things that would be peripherals on a real architecture
/// # Includes:
/// - Random number generation
/// - Drawing to the display
mod io {
    use super::*;

    /// Cxbb: Stores a random number & the provided byte into vX
    #[test]
    fn rand() {
        let mut cpu = setup_environment();
        for xb in 0..0x10fff {
            let (x, b) = ((xb >> 8) % 16, xb as u8);
            cpu.v[x] = 0;
            cpu.rand(x, b);
            // We don't know what the number will be,
            // but we do know it'll only use bits from b
            assert_eq!(0, cpu.v[x] & !b);
        }
    }

    /// Seeded generators repeat themselves
    #[test]
    fn rand_seeded() {
        let (mut a, mut b) = (setup_environment(), setup_environment());
        for x in 0..0x10 {
            a.rand(x, 0xff);
            b.rand(x, 0xff);
        }
        assert_eq!(a.v, b.v);
    }

    mod display {
        use super::*;

        fn draw_setup(quirks: Quirks) -> CPU {
            let mut cpu = with_quirks(quirks);
            // Point I at a solid block
            cpu.write(0x300, 0xff);
            cpu.write(0x301, 0xff);
            cpu.i = 0x300;
            cpu
        }

        /// Dxyn: Draws n-byte sprite to the screen at coordinates (vX, vY)
        #[test]
        fn draw() {
            let mut cpu = draw_setup(Mode::XOChip.into());
            cpu.clear_screen();
            cpu.flags.dirty = false;
            cpu.draw(0, 1, 1);
            assert_eq!(&[0xff], &cpu.screen.as_bytes()[0..1]);
            assert_eq!(0, cpu.v[0xf]);
            assert!(cpu.flags.dirty);
        }

        /// Drawing the same sprite twice erases it, and reports a collision
        #[test]
        fn draw_twice() {
            let mut cpu = draw_setup(Mode::XOChip.into());
            (cpu.v[0], cpu.v[1]) = (13, 7);
            cpu.draw(0, 1, 1);
            cpu.draw(0, 1, 1);
            assert!(!cpu.screen.any());
            assert_eq!(1, cpu.v[0xf]);
        }

        /// Sprites are read starting at I
        #[test]
        fn draw_reads_i() {
            let mut cpu = draw_setup(Mode::XOChip.into());
            cpu.load_sprite(0); // "0"
            cpu.draw(0, 0, 5);
            for (row, &byte) in FONT[0..5].iter().enumerate() {
                assert_eq!(byte, cpu.screen.as_bytes()[row * 8]);
            }
        }

        /// With display_wait, only one sprite is drawn per frame
        #[test]
        fn display_wait() {
            let mut cpu = draw_setup(Mode::Chip8.into());
            cpu.pc = 0x302;
            cpu.draw(0, 1, 1);
            assert!(cpu.screen.any());
            assert!(cpu.flags.draw_wait);
            // The second draw rewinds, to be retried
            cpu.draw(0, 1, 1);
            assert_eq!(0x300, cpu.pc);
            assert!(cpu.screen.any());
            // Until the frame is over
            for _ in 0..cpu.config.ratio {
                cpu.retire();
            }
            assert!(!cpu.flags.draw_wait);
            cpu.draw(0, 1, 1);
            assert!(!cpu.screen.any());
        }

        /// Without clipping, sprites wrap off the right edge
        #[test]
        fn draw_wrapping() {
            let mut cpu = draw_setup(Mode::XOChip.into());
            (cpu.v[0], cpu.v[1]) = (60, 31);
            cpu.draw(0, 1, 2);
            assert_eq!(0x0f, cpu.screen.as_bytes()[31 * 8 + 7]);
            assert_eq!(0xf0, cpu.screen.as_bytes()[31 * 8]);
            // and off the bottom
            assert_eq!(0x0f, cpu.screen.as_bytes()[7]);
        }

        /// With clipping, they're cut off
        #[test]
        fn draw_clipping() {
            let mut cpu = draw_setup(Quirks {
                display_wait: false,
                ..Quirks::from(Mode::Chip8)
            });
            (cpu.v[0], cpu.v[1]) = (60, 31);
            cpu.draw(0, 1, 2);
            assert_eq!(0x0f, cpu.screen.as_bytes()[31 * 8 + 7]);
            assert_eq!(0x00, cpu.screen.as_bytes()[31 * 8]);
            assert_eq!(0x00, cpu.screen.as_bytes()[7]);
        }
    }

    mod cf {
        use super::*;
        /// Ex9E: Skip next instruction if key == #X
        #[test]
        fn skip_key_equals() {
            let mut cpu = setup_environment();
            for ka in 0..=0x7fef {
                let (key, addr) = ((ka & 0xf) as u8, ka >> 8);
                // positive test (no keys except key pressed)
                cpu.keys.clear();
                cpu.press(key as usize).unwrap();
                for x in 0..=0xf {
                    cpu.pc = addr;
                    cpu.v[x] = key;
                    cpu.skip_key_equals(x);
                    assert_eq!(cpu.pc, addr.wrapping_add(2));
                    cpu.v[x] = 0xff;
                }
                // negative test (all keys except key pressed)
                (0..KEY_COUNT).for_each(|k| cpu.keys.set(k, 0, true));
                cpu.release(key as usize).unwrap();
                for x in 0..=0xf {
                    cpu.pc = addr;
                    cpu.v[x] = key;
                    cpu.skip_key_equals(x);
                    assert_eq!(cpu.pc, addr);
                    cpu.v[x] = 0xff;
                }
            }
        }

        /// ExA1: Skip next instruction if key != #X
        #[test]
        fn skip_key_not_equals() {
            let mut cpu = setup_environment();
            for ka in 0..=0x7fcf {
                let (key, addr) = ((ka & 0xf) as u8, ka >> 8);
                cpu.keys.clear();
                cpu.press(key as usize).unwrap();
                for x in 0..=0xf {
                    cpu.pc = addr;
                    cpu.v[x] = key;
                    cpu.skip_key_not_equals(x);
                    assert_eq!(cpu.pc, addr);
                    cpu.v[x] = 0xff;
                }
                (0..KEY_COUNT).for_each(|k| cpu.keys.set(k, 0, true));
                cpu.release(key as usize).unwrap();
                for x in 0..=0xf {
                    cpu.pc = addr;
                    cpu.v[x] = key;
                    cpu.skip_key_not_equals(x);
                    assert_eq!(cpu.pc, addr.wrapping_add(2));
                    cpu.v[x] = 0xff;
                }
            }
        }

        /// Only the low nibble of vX picks the key
        #[test]
        fn skip_key_masks() {
            let mut cpu = setup_environment();
            cpu.press(0x3).unwrap();
            cpu.pc = 0x400;
            cpu.v[0] = 0xa3;
            cpu.skip_key_equals(0);
            assert_eq!(0x402, cpu.pc);
        }

        /// Fx0A: Wait for key, then vX = K
        ///
        /// The key is captured while held, and execution continues once it's released
        #[test]
        fn wait_for_key() {
            let mut cpu = setup_environment();
            for key in 0..0x10 {
                for x in 0..0x10 {
                    cpu.pc = 0x402;
                    cpu.v[x] = 0xff;
                    // Nothing pressed: wait
                    cpu.wait_for_key(x);
                    assert_eq!(0x400, cpu.pc);
                    assert!(!cpu.flags.key_release);
                    assert_eq!(0xff, cpu.v[x]);
                    // When the button is pressed
                    assert!(cpu.press(key).expect("Key should be pressed"));
                    assert!(!cpu.press(key).expect("Key shouldn't be pressed again"));
                    cpu.pc = 0x402;
                    cpu.wait_for_key(x);
                    assert_eq!(0x400, cpu.pc);
                    assert!(cpu.flags.key_release);
                    assert_eq!(key as u8, cpu.v[x]);
                    // When the button is held
                    cpu.pc = 0x402;
                    cpu.wait_for_key(x);
                    assert_eq!(0x400, cpu.pc);
                    // And when the button is released!
                    assert!(cpu.release(key).expect("Key should be released"));
                    assert!(!cpu.release(key).expect("Key shouldn't be released again"));
                    cpu.pc = 0x402;
                    cpu.wait_for_key(x);
                    assert_eq!(0x402, cpu.pc);
                    assert!(!cpu.flags.key_release);
                    assert_eq!(key as u8, cpu.v[x]);
                }
            }
        }

        /// The lowest held key wins
        #[test]
        fn wait_for_lowest_key() {
            let mut cpu = setup_environment();
            cpu.press(0xb).unwrap();
            cpu.press(0x4).unwrap();
            cpu.wait_for_key(2);
            assert_eq!(0x4, cpu.v[2]);
        }
    }

    /// Fx07: Get the current DT, and put it in vX
    #[test]
    fn load_delay_timer() {
        let mut cpu = setup_environment();
        for word in 0..=0xff {
            for x in 0..=0xf {
                cpu.delay = word;

                cpu.load_delay_timer(x);

                assert_eq!(cpu.v[x], word);
            }
        }
    }

    /// Fx15: Load vX into DT
    #[test]
    fn store_delay_timer() {
        let mut cpu = setup_environment();
        for word in 0..=0xff {
            for x in 0..=0xf {
                cpu.v[x] = word;

                cpu.store_delay_timer(x);

                assert_eq!(cpu.delay, word);
            }
        }
    }

    /// Fx18: Load vX into ST
    #[test]
    fn store_sound_timer() {
        let mut cpu = setup_environment();
        for word in 0..=0xff {
            for x in 0..=0xf {
                cpu.v[x] = word;

                cpu.store_sound_timer(x);

                assert_eq!(cpu.sound, word);
                assert_eq!(word != 0, cpu.beeping());
            }
        }
    }

    mod sprite {
        use super::*;

        struct SpriteTest {
            input: u8,
            output: &'static [u8],
        }

        /// Verify the character sprite addresses with the data they should return
        #[rustfmt::skip]
        const TESTS: [SpriteTest; 16] = [
            SpriteTest { input: 0x0, output: &[0xf0, 0x90, 0x90, 0x90, 0xf0] },
            SpriteTest { input: 0x1, output: &[0x20, 0x60, 0x20, 0x20, 0x70] },
            SpriteTest { input: 0x2, output: &[0xf0, 0x10, 0xf0, 0x80, 0xf0] },
            SpriteTest { input: 0x3, output: &[0xf0, 0x10, 0xf0, 0x10, 0xf0] },
            SpriteTest { input: 0x4, output: &[0x90, 0x90, 0xf0, 0x10, 0x10] },
            SpriteTest { input: 0x5, output: &[0xf0, 0x80, 0xf0, 0x10, 0xf0] },
            SpriteTest { input: 0x6, output: &[0xf0, 0x80, 0xf0, 0x90, 0xf0] },
            SpriteTest { input: 0x7, output: &[0xf0, 0x10, 0x20, 0x40, 0x40] },
            SpriteTest { input: 0x8, output: &[0xf0, 0x90, 0xf0, 0x90, 0xf0] },
            SpriteTest { input: 0x9, output: &[0xf0, 0x90, 0xf0, 0x10, 0xf0] },
            SpriteTest { input: 0xa, output: &[0xf0, 0x90, 0xf0, 0x90, 0x90] },
            SpriteTest { input: 0xb, output: &[0xe0, 0x90, 0xe0, 0x90, 0xe0] },
            SpriteTest { input: 0xc, output: &[0xf0, 0x80, 0x80, 0x80, 0xf0] },
            SpriteTest { input: 0xd, output: &[0xe0, 0x90, 0x90, 0x90, 0xe0] },
            SpriteTest { input: 0xe, output: &[0xf0, 0x80, 0xf0, 0x80, 0xf0] },
            SpriteTest { input: 0xf, output: &[0xf0, 0x80, 0xf0, 0x80, 0x80] },
        ];

        /// Fx29: Load sprite for character vX into I
        #[test]
        fn load_sprite() {
            let mut cpu = setup_environment();
            for test in TESTS {
                let reg = 0xf & random::<usize>();
                // Only the low nibble picks the character
                cpu.v[reg] = test.input | (random::<u8>() & 0xf0);

                cpu.load_sprite(reg);

                let addr = cpu.i as usize;
                assert_eq!(&cpu.memory[addr..addr + 5], test.output);
            }
        }
    }

    mod bcdtest {
        use super::*;

        struct BCDTest {
            // value to test
            input: u8,
            // result
            output: &'static [u8],
        }

        const BCD_TESTS: [BCDTest; 4] = [
            BCDTest {
                input: 0,
                output: &[0, 0, 0],
            },
            BCDTest {
                input: 255,
                output: &[2, 5, 5],
            },
            BCDTest {
                input: 127,
                output: &[1, 2, 7],
            },
            BCDTest {
                input: 9,
                output: &[0, 0, 9],
            },
        ];

        /// Fx33: BCD convert X into I`[0..3]`
        #[test]
        fn bcd_convert() {
            for test in BCD_TESTS {
                let mut cpu = setup_environment();
                let addr = 0xff0 & random::<u16>() as usize;
                cpu.i = addr as u16;
                cpu.v[5] = test.input;

                cpu.bcd_convert(5);

                assert_eq!(&cpu.memory[addr..addr + 3], test.output);
                // I is untouched
                assert_eq!(addr as u16, cpu.i);
            }
        }
    }

    mod dma {
        use super::*;
        const DATA: &[u8] = b"ABCDEFGHIJKLMNOP";

        /// Fx55: DMA Stor from I to registers 0..X
        #[test]
        fn store() {
            for memory_increment in [false, true] {
                let mut cpu = with_quirks(Quirks {
                    memory_increment,
                    ..Default::default()
                });
                let addr = 0x456;
                cpu.v.copy_from_slice(DATA);
                for len in 0..16 {
                    cpu.i = addr as u16;
                    cpu.store_dma(len);
                    // Check that memory got the correct data
                    let memory = &mut cpu.memory[addr..addr + DATA.len()];
                    assert_eq!(memory[0..=len], DATA[0..=len]);
                    assert_eq!(memory[len + 1..], [0; 16][len + 1..]);
                    memory.fill(0);
                    let expected_i = if memory_increment { addr + len + 1 } else { addr };
                    assert_eq!(expected_i as u16, cpu.i);
                }
            }
        }

        /// Fx65: DMA Load from I to registers 0..X
        #[test]
        fn load() {
            for memory_increment in [false, true] {
                let mut cpu = with_quirks(Quirks {
                    memory_increment,
                    ..Default::default()
                });
                let addr = 0x456;
                cpu.memory[addr..addr + DATA.len()].copy_from_slice(DATA);
                for len in 0..16 {
                    cpu.i = addr as u16;
                    cpu.load_dma(len);
                    // Check that registers grabbed the correct data
                    assert_eq!(cpu.v[0..=len], DATA[0..=len]);
                    assert_eq!(cpu.v[len + 1..], [0; 16][len + 1..]);
                    cpu.v.fill(0);
                    let expected_i = if memory_increment { addr + len + 1 } else { addr };
                    assert_eq!(expected_i as u16, cpu.i);
                }
            }
        }

        /// Writes past the end of memory are dropped, and reads past it are 0
        #[test]
        fn out_of_memory() {
            let mut cpu = CPU::new(Config {
                memory_size: 0x800,
                ..Default::default()
            })
            .unwrap();
            cpu.v.copy_from_slice(DATA);
            cpu.i = 0x7fe;
            cpu.store_dma(3);
            assert_eq!(b"AB", &cpu.memory[0x7fe..]);
            cpu.i = 0x7fe;
            cpu.load_dma(3);
            assert_eq!(b"AB\0\0", &cpu.v[0..4]);
        }
    }
}

mod behavior {
    use super::*;

    /// Timers count down once every `ratio` retired instructions
    #[test]
    fn timers() {
        let mut cpu = setup_environment();
        (cpu.delay, cpu.sound) = (10, 3);
        for _ in 0..cpu.config.ratio * 5 {
            cpu.retire();
        }
        assert_eq!(5, cpu.delay);
        assert_eq!(0, cpu.sound);
        assert!(!cpu.beeping());
    }

    #[test]
    fn timers_stop_at_zero() {
        let mut cpu = setup_environment();
        cpu.delay = 1;
        for _ in 0..cpu.config.ratio * 3 {
            cpu.retire();
        }
        assert_eq!(0, cpu.delay);
        assert_eq!(30, cpu.cycle);
    }

    #[test]
    fn reset() {
        let mut cpu = setup_environment();
        cpu.pc = 0x346;
        cpu.v[4] = 4;
        cpu.stack.push(0x222);
        cpu.press(1).unwrap();
        cpu.screen.set(1, 1, true);
        cpu.retire();
        cpu.reset();
        assert_eq!(setup_environment(), cpu);
    }

    /// Loading a program clears whatever was loaded before
    #[test]
    fn load_program_bytes() {
        let mut cpu = setup_environment();
        cpu.load_program_bytes(&[0xaa]).unwrap();
        assert_eq!(&[0xaa, 0x00, 0x00, 0x00], &cpu.memory[0x200..0x204]);
        assert!(matches!(
            cpu.load_program_bytes(&[0; 0xe01]),
            Err(Error::RomTooLarge { len: 0xe01, room: 0xe00, start: 0x200 })
        ));
    }

    #[test]
    fn fetch_wraps() {
        let mut cpu = setup_environment();
        cpu.write(0xfff, 0x12);
        assert_eq!(0x12f0, cpu.fetch(0xfff));
    }

    #[test]
    fn invalid_key() {
        let mut cpu = setup_environment();
        assert!(matches!(cpu.press(0x10), Err(Error::InvalidKey { key: 0x10 })));
        assert!(matches!(cpu.release(0x10), Err(Error::InvalidKey { key: 0x10 })));
    }

    #[test]
    fn invalid_config() {
        for config in [
            Config { ratio: 0, ..Default::default() },
            Config { memory_size: 0x1001, ..Default::default() },
            Config { start: 0x10, ..Default::default() },
            Config { start: 0x800, memory_size: 0x800, ..Default::default() },
        ] {
            assert!(matches!(CPU::new(config), Err(Error::InvalidConfig { .. })));
        }
    }

    #[test]
    fn dump() {
        setup_environment().dump();
    }

    #[test]
    fn debug() {
        println!("{:?}", setup_environment());
    }
}
