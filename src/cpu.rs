// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! The Chip-8 CPU.
//!
//! The `Cpu` struct holds the architectural register state (`V0`-`VF`, `I`,
//! the program counter and the call stack) and executes one instruction per
//! call to `step`.  Memory and the peripherals are not owned by the CPU;
//! they are lent to it for the duration of a step through a `Bus`.
//!
//! An instruction that fails (an invalid opcode, an out-of-bounds memory
//! access or a stack error) does so before changing any state, and the
//! program counter stays on the failing instruction.

use std::default::Default;
use std::num::Wrapping;

use failure::{Error, ResultExt};
use rand;

use PROG_START;
use STACK_DEPTH;
use display::{self, HEX_HEIGHT};
use input::{Key, Keypad};
use instruction::{AddressOutOfBoundsError, Instruction, Opcode, Register};
use memory::{Memory, FONT_START};
use timer::Countdown;

/// An error resulting from a `RET` instruction with an empty call stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "no subroutine to return from")]
pub struct StackUnderflowError;

/// An error resulting from a `CALL` instruction with a full call stack.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "call stack overflowed (maximum depth is {})", _0)]
pub struct StackOverflowError(pub usize);

/// Behavior switches for instructions whose semantics differ between
/// historical interpreters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    /// Whether `SHR`/`SHL` shift `Vy` into `Vx`, rather than shifting `Vx` in
    /// place.
    pub shift: bool,
    /// Whether `LD [I], Vx` and `LD Vx, [I]` leave `I` pointing just past the
    /// last byte transferred.
    pub load: bool,
}

/// The execution state of the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Ready to execute the next instruction.
    Running,
    /// Suspended in `LD Vx, K` until a key is pressed.
    AwaitingKey(Register),
}

/// The memory and peripherals that the CPU works on during a step.
pub struct Bus<'a> {
    pub memory: &'a mut Memory,
    pub display: &'a mut display::Buffer,
    pub keypad: &'a mut Keypad,
    pub delay: &'a mut Countdown,
    pub sound: &'a mut Countdown,
}

/// A Chip-8 CPU.
pub struct Cpu {
    /// The general-purpose registers `V0`-`VF`.
    regs: [Wrapping<u8>; 16],
    /// The special register `I`.
    reg_i: u16,
    /// The program counter.
    pc: u16,
    /// The call stack (for returning from subroutines).
    stack: Vec<u16>,
    /// The current execution state.
    state: State,
    /// The quirks in effect.
    quirks: Quirks,
}

impl Cpu {
    /// Returns a new CPU with the given quirks, ready to execute from
    /// `PROG_START`.
    pub fn new(quirks: Quirks) -> Self {
        Cpu {
            regs: [Wrapping(0); 16],
            reg_i: 0,
            pc: PROG_START as u16,
            stack: Vec::with_capacity(STACK_DEPTH),
            state: State::Running,
            quirks,
        }
    }

    /// Restores the power-on state, keeping the configured quirks.
    pub fn reset(&mut self) {
        *self = Cpu::new(self.quirks);
    }

    /// Returns the quirks in effect.
    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Returns the value in the given register.
    pub fn register(&self, reg: Register) -> u8 {
        self.regs[reg as usize].0
    }

    /// Sets the given register to the given value.
    pub fn set_register(&mut self, reg: Register, val: u8) {
        self.regs[reg as usize].0 = val
    }

    /// Returns the value of register `I`.
    pub fn i(&self) -> u16 {
        self.reg_i
    }

    /// Sets the value of register `I`.
    pub fn set_i(&mut self, val: u16) {
        self.reg_i = val;
    }

    /// Returns the value of the program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets the value of the program counter.
    pub fn set_pc(&mut self, val: u16) {
        self.pc = val;
    }

    /// Returns the return addresses on the call stack, innermost last.
    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    /// Returns the current execution state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns whether the CPU is suspended waiting for a key press.
    pub fn awaiting_key(&self) -> bool {
        match self.state {
            State::AwaitingKey(_) => true,
            State::Running => false,
        }
    }

    /// Returns the opcode at the program counter.
    pub fn current_opcode(&self, memory: &Memory) -> Result<Opcode, AddressOutOfBoundsError> {
        let word = memory.read_word(self.pc)?;
        Ok(Opcode(word))
    }

    /// Returns the instruction at the program counter.
    pub fn current_instruction(&self, memory: &Memory) -> Result<Instruction, Error> {
        let opcode = self.current_opcode(memory)
            .with_context(|_| format!("could not fetch instruction at {:#05X}", self.pc))?;
        Ok(Instruction::from_opcode(opcode)
            .with_context(|_| format!("could not decode instruction at {:#05X}", self.pc))?)
    }

    /// Performs a single fetch-decode-execute cycle.
    ///
    /// While waiting for a key press, this only checks the keypad; the wait
    /// ends (and the program counter moves on) once a key is newly pressed.
    pub fn step(&mut self, bus: &mut Bus) -> Result<(), Error> {
        if let State::AwaitingKey(reg) = self.state {
            if let Some(key) = bus.keypad.take_pressed() {
                debug!("key {:?} pressed, storing in {}", key, reg);
                self.set_register(reg, key as u8);
                self.state = State::Running;
                self.pc = self.pc.wrapping_add(2);
            }
            return Ok(());
        }

        let ins = self.current_instruction(bus.memory)?;
        trace!("{:#05X}: {}", self.pc, ins);
        self.execute(ins, bus)
    }

    /// Executes the given instruction in the current CPU context.
    ///
    /// The CPU will behave as if the given instruction were executed at the
    /// current program location in memory.
    pub fn execute(&mut self, ins: Instruction, bus: &mut Bus) -> Result<(), Error> {
        use self::Instruction::*;

        match ins {
            Sys(_) => debug!("ignoring {} at {:#05X}", ins, self.pc),
            Cls => bus.display.clear(),
            Ret => {
                self.pc = self.pop()
                    .with_context(|_| format!("error executing {}", ins))?;
                return Ok(());
            }
            Jp(addr) => {
                self.pc = addr.as_u16();
                return Ok(());
            }
            Call(addr) => {
                let ret = self.pc.wrapping_add(2);
                self.push(ret)
                    .with_context(|_| format!("error executing {}", ins))?;
                self.pc = addr.as_u16();
                return Ok(());
            }
            SeByte(reg, b) => if self.register(reg) == b {
                self.pc = self.pc.wrapping_add(4);
                return Ok(());
            },
            SneByte(reg, b) => if self.register(reg) != b {
                self.pc = self.pc.wrapping_add(4);
                return Ok(());
            },
            SeReg(reg1, reg2) => if self.register(reg1) == self.register(reg2) {
                self.pc = self.pc.wrapping_add(4);
                return Ok(());
            },
            LdByte(reg, b) => self.set_register(reg, b),
            AddByte(reg, b) => self.regs[reg as usize] += Wrapping(b),
            LdReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.set_register(reg1, r2);
            }
            Or(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 | r2);
            }
            And(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 & r2);
            }
            Xor(reg1, reg2) => {
                let r1 = self.register(reg1);
                let r2 = self.register(reg2);
                self.set_register(reg1, r1 ^ r2);
            }
            AddReg(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.add(reg1, r2);
            }
            Sub(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.sub(reg1, r2);
            }
            Shr(reg1, reg2) => self.shr(reg1, reg2),
            Subn(reg1, reg2) => {
                let r2 = self.register(reg2);
                self.subn(reg1, r2);
            }
            Shl(reg1, reg2) => self.shl(reg1, reg2),
            SneReg(reg1, reg2) => if self.register(reg1) != self.register(reg2) {
                self.pc = self.pc.wrapping_add(4);
                return Ok(());
            },
            LdI(addr) => self.reg_i = addr.as_u16(),
            JpV0(addr) => {
                self.pc = addr.as_u16() + self.register(Register::V0) as u16;
                return Ok(());
            }
            Rnd(reg, b) => self.set_register(reg, rand::random::<u8>() & b),
            Drw(reg1, reg2, n) => self.drw(bus, reg1, reg2, n)
                .with_context(|_| format!("error executing {}", ins))?,
            Skp(reg) => if bus.keypad.is_pressed(Key::from_byte(self.register(reg))) {
                self.pc = self.pc.wrapping_add(4);
                return Ok(());
            },
            Sknp(reg) => if !bus.keypad.is_pressed(Key::from_byte(self.register(reg))) {
                self.pc = self.pc.wrapping_add(4);
                return Ok(());
            },
            LdRegDt(reg) => {
                let dt = bus.delay.get();
                self.set_register(reg, dt);
            }
            LdKey(reg) => {
                // Only presses that happen from now on count.
                bus.keypad.take_pressed();
                debug!("waiting for key press for {}", reg);
                self.state = State::AwaitingKey(reg);
                return Ok(());
            }
            LdDtReg(reg) => bus.delay.set(self.register(reg)),
            LdSt(reg) => bus.sound.set(self.register(reg)),
            AddI(reg) => {
                let r = self.register(reg) as u16;
                self.reg_i = self.reg_i.wrapping_add(r);
            }
            LdF(reg) => {
                let digit = self.register(reg) as usize & 0xF;
                self.reg_i = (FONT_START + HEX_HEIGHT * digit) as u16;
            }
            LdB(reg) => self.ld_b(bus.memory, reg)
                .with_context(|_| format!("error executing {}", ins))?,
            LdDerefIReg(reg) => self.ld_deref_i_reg(bus.memory, reg)
                .with_context(|_| format!("error executing {}", ins))?,
            LdRegDerefI(reg) => self.ld_reg_deref_i(bus.memory, reg)
                .with_context(|_| format!("error executing {}", ins))?,
        }

        self.pc = self.pc.wrapping_add(2);
        Ok(())
    }

    /// Pushes a return address onto the call stack.
    fn push(&mut self, addr: u16) -> Result<(), StackOverflowError> {
        if self.stack.len() >= STACK_DEPTH {
            Err(StackOverflowError(STACK_DEPTH))
        } else {
            self.stack.push(addr);
            Ok(())
        }
    }

    /// Pops a return address from the call stack.
    fn pop(&mut self) -> Result<u16, StackUnderflowError> {
        self.stack.pop().ok_or(StackUnderflowError)
    }

    /// Adds the given byte to the given register, setting `VF` to 1 on carry
    /// or 0 otherwise.
    fn add(&mut self, reg: Register, val: u8) {
        let (sum, carry) = self.register(reg).overflowing_add(val);
        self.set_register(reg, sum);
        self.set_register(Register::VF, carry as u8);
    }

    /// Subtracts the given byte from the given register, setting `VF` to 0 on
    /// borrow or 1 otherwise.
    fn sub(&mut self, reg: Register, val: u8) {
        let (diff, borrow) = self.register(reg).overflowing_sub(val);
        self.set_register(reg, diff);
        self.set_register(Register::VF, !borrow as u8);
    }

    /// Sets `reg` to `val - reg`, setting `VF` to 0 on borrow or 1 otherwise.
    fn subn(&mut self, reg: Register, val: u8) {
        let (diff, borrow) = val.overflowing_sub(self.register(reg));
        self.set_register(reg, diff);
        self.set_register(Register::VF, !borrow as u8);
    }

    /// Returns the operand of a shift instruction.
    fn shift_source(&self, reg1: Register, reg2: Register) -> u8 {
        if self.quirks.shift {
            self.register(reg2)
        } else {
            self.register(reg1)
        }
    }

    /// Sets `reg1` to the shift source shifted right, setting `VF` to the old
    /// lowest bit.
    fn shr(&mut self, reg1: Register, reg2: Register) {
        let src = self.shift_source(reg1, reg2);
        self.set_register(reg1, src >> 1);
        self.set_register(Register::VF, src & 1);
    }

    /// Sets `reg1` to the shift source shifted left, setting `VF` to the old
    /// highest bit.
    fn shl(&mut self, reg1: Register, reg2: Register) {
        let src = self.shift_source(reg1, reg2);
        self.set_register(reg1, src << 1);
        self.set_register(Register::VF, src >> 7);
    }

    /// Implements the `DRW` operation.
    fn drw(
        &mut self,
        bus: &mut Bus,
        reg1: Register,
        reg2: Register,
        n: u8,
    ) -> Result<(), AddressOutOfBoundsError> {
        let x = self.register(reg1) as usize;
        let y = self.register(reg2) as usize;
        let sprite = bus.memory.slice(self.reg_i, n as usize)?;

        let collision = bus.display.draw(x, y, sprite);
        self.set_register(Register::VF, collision as u8);
        Ok(())
    }

    /// Implements the `LD B, Vx` operation.
    fn ld_b(&self, memory: &mut Memory, reg: Register) -> Result<(), AddressOutOfBoundsError> {
        let val = self.register(reg);
        let digits = memory.slice_mut(self.reg_i, 3)?;
        digits[0] = val / 100;
        digits[1] = val % 100 / 10;
        digits[2] = val % 10;
        Ok(())
    }

    /// Implements the `LD [I], Vx` operation.
    fn ld_deref_i_reg(
        &mut self,
        memory: &mut Memory,
        reg: Register,
    ) -> Result<(), AddressOutOfBoundsError> {
        let n = reg as usize + 1;
        for (dest, src) in memory
            .slice_mut(self.reg_i, n)?
            .iter_mut()
            .zip(self.regs.iter())
        {
            *dest = src.0;
        }
        if self.quirks.load {
            self.reg_i = self.reg_i.wrapping_add(n as u16);
        }

        Ok(())
    }

    /// Implements the `LD Vx, [I]` operation.
    fn ld_reg_deref_i(
        &mut self,
        memory: &Memory,
        reg: Register,
    ) -> Result<(), AddressOutOfBoundsError> {
        let n = reg as usize + 1;
        for (dest, src) in self.regs
            .iter_mut()
            .zip(memory.slice(self.reg_i, n)?.iter())
        {
            *dest = Wrapping(*src);
        }
        if self.quirks.load {
            self.reg_i = self.reg_i.wrapping_add(n as u16);
        }

        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new(Quirks::default())
    }
}
