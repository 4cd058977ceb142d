/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! A CHIP-8 virtual machine.
//!
//! The `Emulator` type in the `emulator` module is the entry point for host
//! applications: it owns the CPU together with its memory and peripherals,
//! and exposes `load`, `single_step` and `execute`.  The remaining modules
//! contain the individual components, which can also be used on their own
//! (for example, to drive the `Cpu` against a custom memory image in tests).

#[macro_use]
extern crate enum_primitive;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate num;
extern crate rand;
extern crate time;

/// The size of the Chip-8's memory, in bytes.
pub const MEM_SIZE: usize = 0x1000;
/// The address where programs should be loaded.
pub const PROG_START: usize = 0x200;
/// The maximum size of a Chip-8 program, in bytes.
pub const PROG_SIZE: usize = MEM_SIZE - PROG_START;
/// The maximum depth of the call stack.
pub const STACK_DEPTH: usize = 16;

pub mod cpu;
pub mod display;
pub mod emulator;
pub mod input;
pub mod instruction;
pub mod memory;
pub mod rom;
pub mod timer;

pub use cpu::{Cpu, StackOverflowError, StackUnderflowError};
pub use emulator::Emulator;
pub use instruction::{Address, AddressOutOfBoundsError, Instruction, InvalidOpcodeError, Opcode,
                      Register};
pub use memory::Memory;
pub use rom::{Rom, RomTooLargeError};
