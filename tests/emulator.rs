/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! Runs small programs through the public emulator interface.

extern crate chip8_vm;
extern crate failure;

use std::io::Cursor;

use failure::Error;

use chip8_vm::emulator::Options;
use chip8_vm::input::Key;
use chip8_vm::{Emulator, InvalidOpcodeError, Opcode, Register, RomTooLargeError,
               StackOverflowError, PROG_SIZE};

/// Returns an emulator with a stepped clock and the given program loaded.
fn emulator_with(program: &[u8]) -> Emulator {
    let mut emulator = Emulator::with_options(Options::testing());
    emulator.load(program).unwrap();
    emulator
}

fn steps(emulator: &mut Emulator, n: usize) {
    for _ in 0..n {
        emulator.single_step().unwrap();
    }
}

fn root_cause<T: failure::Fail>(err: &Error) -> Option<&T> {
    err.find_root_cause().downcast_ref::<T>()
}

#[test]
fn load_and_add() {
    let mut emulator = emulator_with(&[0x60, 0x05, 0x70, 0x03]);
    steps(&mut emulator, 2);
    assert_eq!(emulator.cpu().register(Register::V0), 8);
    assert_eq!(emulator.cpu().pc(), 0x204);
}

#[test]
fn call_and_return() {
    // CALL #220, with RET at #220.
    let mut program = vec![0; 0x22];
    program[0] = 0x22;
    program[1] = 0x20;
    program[0x20] = 0x00;
    program[0x21] = 0xEE;
    let mut emulator = emulator_with(&program);

    emulator.single_step().unwrap();
    assert_eq!(emulator.cpu().pc(), 0x220);
    assert_eq!(emulator.cpu().stack(), &[0x202]);

    emulator.single_step().unwrap();
    assert_eq!(emulator.cpu().pc(), 0x202);
    assert!(emulator.cpu().stack().is_empty());
}

#[test]
fn add_sets_carry() {
    let cases = [(0x00, 0x00), (0x01, 0xFE), (0x01, 0xFF), (0xFF, 0xFF), (0x80, 0x80)];

    for &(a, b) in cases.iter() {
        // LD V0, a; LD V1, b; ADD V0, V1
        let mut emulator = emulator_with(&[0x60, a, 0x61, b, 0x80, 0x14]);
        steps(&mut emulator, 3);
        let sum = u16::from(a) + u16::from(b);
        assert_eq!(emulator.cpu().register(Register::V0), sum as u8);
        assert_eq!(
            emulator.cpu().register(Register::VF),
            (sum > 0xFF) as u8,
            "{:#04X} + {:#04X}",
            a,
            b
        );
    }
}

#[test]
fn sprite_drawn_twice_collides() {
    // LD I, #000; LD V0, #00; DRW V0, V0, 5; DRW V0, V0, 5
    let mut emulator = emulator_with(&[0xA0, 0x00, 0x60, 0x00, 0xD0, 0x05, 0xD0, 0x05]);

    steps(&mut emulator, 3);
    assert_eq!(emulator.cpu().register(Register::VF), 0);
    // The top row of the "0" glyph is 0xF0.
    for x in 0..4 {
        assert!(emulator.display().is_set(x, 0));
    }
    assert!(!emulator.display().is_set(4, 0));
    assert!(emulator.display().to_string().starts_with("####...."));

    emulator.single_step().unwrap();
    assert_eq!(emulator.cpu().register(Register::VF), 1);
    assert!(!emulator.display().to_string().contains('#'));
}

#[test]
fn skip_if_equal() {
    // LD V0, #05; SE V0, #05
    let mut emulator = emulator_with(&[0x60, 0x05, 0x30, 0x05]);
    steps(&mut emulator, 2);
    assert_eq!(emulator.cpu().pc(), 0x206);

    // LD V0, #05; SE V0, #06
    let mut emulator = emulator_with(&[0x60, 0x05, 0x30, 0x06]);
    steps(&mut emulator, 2);
    assert_eq!(emulator.cpu().pc(), 0x204);
}

#[test]
fn unbounded_recursion_overflows() {
    // CALL #200
    let mut emulator = emulator_with(&[0x22, 0x00]);
    steps(&mut emulator, 16);
    assert_eq!(emulator.cpu().stack().len(), 16);

    let err = emulator.single_step().unwrap_err();
    assert_eq!(
        root_cause::<StackOverflowError>(&err),
        Some(&StackOverflowError(16))
    );
    assert_eq!(emulator.cpu().stack().len(), 16);
    assert_eq!(emulator.cpu().pc(), 0x200);
}

#[test]
fn wait_for_key() {
    // LD V3, K
    let mut emulator = emulator_with(&[0xF3, 0x0A]);

    // A key already down before the wait does not count.
    emulator.keypad_mut().press(Key::K1);
    steps(&mut emulator, 3);
    assert!(emulator.cpu().awaiting_key());
    assert_eq!(emulator.cpu().pc(), 0x200);

    emulator.keypad_mut().press(Key::K7);
    emulator.single_step().unwrap();
    assert!(!emulator.cpu().awaiting_key());
    assert_eq!(emulator.cpu().register(Register::V3), 7);
    assert_eq!(emulator.cpu().pc(), 0x202);
}

#[test]
fn timers_count_down_while_executing() {
    // LD V0, #03; LD DT, V0; JP #204
    let mut emulator = emulator_with(&[0x60, 0x03, 0xF0, 0x15, 0x12, 0x04]);
    let mut delays = Vec::new();
    emulator
        .execute(|emu| {
            delays.push(emu.delay().get());
            Ok(delays.len() < 5)
        })
        .unwrap();

    // The timer is set during the first batch of instructions.
    assert_eq!(delays, vec![0, 2, 1, 0, 0]);
}

#[test]
fn execute_stops_on_invalid_opcode() {
    // LD V0, #01; then an invalid opcode
    let mut emulator = emulator_with(&[0x60, 0x01, 0xFF, 0xFF]);
    let err = emulator.execute(|_| Ok(true)).unwrap_err();

    assert_eq!(
        root_cause::<InvalidOpcodeError>(&err),
        Some(&InvalidOpcodeError(Opcode(0xFFFF)))
    );
    assert_eq!(emulator.cpu().register(Register::V0), 1);
    assert_eq!(emulator.cpu().pc(), 0x202);
}

#[test]
fn program_too_large() {
    let mut emulator = emulator_with(&[0x60, 0x01]);
    let err = emulator.load(&[0; PROG_SIZE + 1]).unwrap_err();
    assert_eq!(
        root_cause::<RomTooLargeError>(&err),
        Some(&RomTooLargeError(PROG_SIZE))
    );
    // The previous program is still there.
    assert_eq!(emulator.memory().read_word(0x200).unwrap(), 0x6001);

    let mut input = Cursor::new(vec![0; PROG_SIZE + 1]);
    assert!(emulator.load_program(&mut input).is_err());
}
