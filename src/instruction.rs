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

//! Chip-8 instructions and opcodes.
//!
//! This module provides the basic types for working with Chip-8 instructions
//! and opcodes, most notably the translation of raw opcodes into the
//! `Instruction` type.  Decoding happens in one place so that the CPU only
//! ever sees well-formed instructions; any opcode pattern outside of the
//! standard table is rejected here with an `InvalidOpcodeError`.

use std::fmt;

use num::FromPrimitive;

use MEM_SIZE;

/// An error resulting from an out-of-bounds address.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "address out of bounds: {:#05X}", _0)]
pub struct AddressOutOfBoundsError(pub usize);

/// An error resulting from an invalid opcode.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "invalid opcode: {}", _0)]
pub struct InvalidOpcodeError(pub Opcode);

enum_from_primitive! {
/// A Chip-8 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    V0 = 0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
}

impl Register {
    /// Returns the register with the given index (only the lowest four bits
    /// are considered).
    pub fn from_index(index: u8) -> Register {
        Register::from_u8(index & 0xF).unwrap()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

/// A Chip-8 opcode.
///
/// Having this as a wrapper around an ordinary `u16` allows for some nice
/// helper methods to be implemented, which make decoding opcodes much easier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Returns the opcode family (the highest nibble).
    fn family(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Returns the `Vx` register corresponding to this opcode.
    ///
    /// This does not guarantee that the result is actually meaningful.
    fn vx(&self) -> Register {
        Register::from_index((self.0 >> 8) as u8)
    }

    /// Returns the `Vy` register corresponding to this opcode.
    ///
    /// This does not guarantee that the result is actually meaningful.
    fn vy(&self) -> Register {
        Register::from_index((self.0 >> 4) as u8)
    }

    /// Returns the `nibble` corresponding to this opcode.
    fn nibble(&self) -> u8 {
        self.0 as u8 & 0xF
    }

    /// Returns the `byte` corresponding to this opcode.
    fn byte(&self) -> u8 {
        self.0 as u8
    }

    /// Returns the `addr` corresponding to this opcode.
    fn addr(&self) -> Address {
        Address((self.0 & 0xFFF) as usize)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:04X}", self.0)
    }
}

/// An address pointing to a Chip-8 memory location.
///
/// Every instance of this type lies within the addressable range, which makes
/// it suitable for the 12-bit address operands of instructions.
///
/// # Examples
///
/// ```
/// use chip8_vm::Address;
///
/// let addr = Address::from_u16(0x204).unwrap();
/// assert_eq!(addr.addr(), 0x204);
/// assert!(Address::from_u16(0x1000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(usize);

impl Address {
    /// Verifies whether the given `u16` address value is valid, returning the
    /// corresponding `Address` if it is.
    pub fn from_u16(addr: u16) -> Result<Self, AddressOutOfBoundsError> {
        Address::from_usize(addr as usize)
    }

    /// Verifies whether the given `usize` address is valid, returning the
    /// corresponding `Address` if it is.
    pub fn from_usize(addr: usize) -> Result<Self, AddressOutOfBoundsError> {
        if addr >= MEM_SIZE {
            Err(AddressOutOfBoundsError(addr))
        } else {
            Ok(Address(addr))
        }
    }

    /// Returns the value of the address.
    pub fn addr(&self) -> usize {
        self.0
    }

    /// Returns the value of the address as a `u16`, which is the width of the
    /// CPU's address registers.
    pub fn as_u16(&self) -> u16 {
        self.0 as u16
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:03X}", self.0)
    }
}

/// A Chip-8 instruction.
///
/// This type guarantees that the instruction it represents is valid, so
/// there is no need to check opcode validity again at execution time.
///
/// # Examples
///
/// Instructions can be created from opcodes:
///
/// ```
/// use chip8_vm::{Instruction, Opcode, Register};
///
/// let instr = Instruction::from_opcode(Opcode(0x7510)).unwrap();
/// assert_eq!(instr, Instruction::AddByte(Register::V5, 0x10));
/// assert_eq!(instr.to_string(), "ADD V5, #10");
/// ```
///
/// Patterns outside the standard opcode table are rejected:
///
/// ```
/// use chip8_vm::{Instruction, Opcode};
///
/// assert!(Instruction::from_opcode(Opcode(0x5121)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `SYS addr` (`0nnn`).
    Sys(Address),
    /// `CLS` (`00E0`).
    Cls,
    /// `RET` (`00EE`).
    Ret,
    /// `JP addr` (`1nnn`).
    Jp(Address),
    /// `CALL addr` (`2nnn`).
    Call(Address),
    /// `SE Vx, byte` (`3xkk`).
    SeByte(Register, u8),
    /// `SNE Vx, byte` (`4xkk`).
    SneByte(Register, u8),
    /// `SE Vx, Vy` (`5xy0`).
    SeReg(Register, Register),
    /// `LD Vx, byte` (`6xkk`).
    LdByte(Register, u8),
    /// `ADD Vx, byte` (`7xkk`).
    AddByte(Register, u8),
    /// `LD Vx, Vy` (`8xy0`).
    LdReg(Register, Register),
    /// `OR Vx, Vy` (`8xy1`).
    Or(Register, Register),
    /// `AND Vx, Vy` (`8xy2`).
    And(Register, Register),
    /// `XOR Vx, Vy` (`8xy3`).
    Xor(Register, Register),
    /// `ADD Vx, Vy` (`8xy4`).
    AddReg(Register, Register),
    /// `SUB Vx, Vy` (`8xy5`).
    Sub(Register, Register),
    /// `SHR Vx, Vy` (`8xy6`).
    Shr(Register, Register),
    /// `SUBN Vx, Vy` (`8xy7`).
    Subn(Register, Register),
    /// `SHL Vx, Vy` (`8xyE`).
    Shl(Register, Register),
    /// `SNE Vx, Vy` (`9xy0`).
    SneReg(Register, Register),
    /// `LD I, addr` (`Annn`).
    LdI(Address),
    /// `JP V0, addr` (`Bnnn`).
    JpV0(Address),
    /// `RND Vx, byte` (`Cxkk`).
    Rnd(Register, u8),
    /// `DRW Vx, Vy, nibble` (`Dxyn`).
    Drw(Register, Register, u8),
    /// `SKP Vx` (`Ex9E`).
    Skp(Register),
    /// `SKNP Vx` (`ExA1`).
    Sknp(Register),
    /// `LD Vx, DT` (`Fx07`).
    LdRegDt(Register),
    /// `LD Vx, K` (`Fx0A`).
    LdKey(Register),
    /// `LD DT, Vx` (`Fx15`).
    LdDtReg(Register),
    /// `LD ST, Vx` (`Fx18`).
    LdSt(Register),
    /// `ADD I, Vx` (`Fx1E`).
    AddI(Register),
    /// `LD F, Vx` (`Fx29`).
    LdF(Register),
    /// `LD B, Vx` (`Fx33`).
    LdB(Register),
    /// `LD [I], Vx` (`Fx55`).
    LdDerefIReg(Register),
    /// `LD Vx, [I]` (`Fx65`).
    LdRegDerefI(Register),
}

impl Instruction {
    /// Returns the instruction corresponding to the given opcode.
    pub fn from_opcode(opcode: Opcode) -> Result<Self, InvalidOpcodeError> {
        use self::Instruction::*;

        Ok(match opcode.family() {
            0x0 => match opcode.0 {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => Sys(opcode.addr()),
            },
            0x1 => Jp(opcode.addr()),
            0x2 => Call(opcode.addr()),
            0x3 => SeByte(opcode.vx(), opcode.byte()),
            0x4 => SneByte(opcode.vx(), opcode.byte()),
            0x5 => if opcode.nibble() == 0 {
                SeReg(opcode.vx(), opcode.vy())
            } else {
                return Err(InvalidOpcodeError(opcode));
            },
            0x6 => LdByte(opcode.vx(), opcode.byte()),
            0x7 => AddByte(opcode.vx(), opcode.byte()),
            0x8 => match opcode.nibble() {
                0x0 => LdReg(opcode.vx(), opcode.vy()),
                0x1 => Or(opcode.vx(), opcode.vy()),
                0x2 => And(opcode.vx(), opcode.vy()),
                0x3 => Xor(opcode.vx(), opcode.vy()),
                0x4 => AddReg(opcode.vx(), opcode.vy()),
                0x5 => Sub(opcode.vx(), opcode.vy()),
                0x6 => Shr(opcode.vx(), opcode.vy()),
                0x7 => Subn(opcode.vx(), opcode.vy()),
                0xE => Shl(opcode.vx(), opcode.vy()),
                _ => return Err(InvalidOpcodeError(opcode)),
            },
            0x9 => if opcode.nibble() == 0 {
                SneReg(opcode.vx(), opcode.vy())
            } else {
                return Err(InvalidOpcodeError(opcode));
            },
            0xA => LdI(opcode.addr()),
            0xB => JpV0(opcode.addr()),
            0xC => Rnd(opcode.vx(), opcode.byte()),
            0xD => Drw(opcode.vx(), opcode.vy(), opcode.nibble()),
            0xE => match opcode.byte() {
                0x9E => Skp(opcode.vx()),
                0xA1 => Sknp(opcode.vx()),
                _ => return Err(InvalidOpcodeError(opcode)),
            },
            0xF => match opcode.byte() {
                0x07 => LdRegDt(opcode.vx()),
                0x0A => LdKey(opcode.vx()),
                0x15 => LdDtReg(opcode.vx()),
                0x18 => LdSt(opcode.vx()),
                0x1E => AddI(opcode.vx()),
                0x29 => LdF(opcode.vx()),
                0x33 => LdB(opcode.vx()),
                0x55 => LdDerefIReg(opcode.vx()),
                0x65 => LdRegDerefI(opcode.vx()),
                _ => return Err(InvalidOpcodeError(opcode)),
            },
            _ => unreachable!("4-bit quantity didn't match 0-15"),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Instruction::*;

        match *self {
            Sys(addr) => write!(f, "SYS {}", addr),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(addr) => write!(f, "JP {}", addr),
            Call(addr) => write!(f, "CALL {}", addr),
            SeByte(reg, b) => write!(f, "SE {}, #{:02X}", reg, b),
            SneByte(reg, b) => write!(f, "SNE {}, #{:02X}", reg, b),
            SeReg(reg1, reg2) => write!(f, "SE {}, {}", reg1, reg2),
            LdByte(reg, b) => write!(f, "LD {}, #{:02X}", reg, b),
            AddByte(reg, b) => write!(f, "ADD {}, #{:02X}", reg, b),
            LdReg(reg1, reg2) => write!(f, "LD {}, {}", reg1, reg2),
            Or(reg1, reg2) => write!(f, "OR {}, {}", reg1, reg2),
            And(reg1, reg2) => write!(f, "AND {}, {}", reg1, reg2),
            Xor(reg1, reg2) => write!(f, "XOR {}, {}", reg1, reg2),
            AddReg(reg1, reg2) => write!(f, "ADD {}, {}", reg1, reg2),
            Sub(reg1, reg2) => write!(f, "SUB {}, {}", reg1, reg2),
            Shr(reg1, reg2) => write!(f, "SHR {}, {}", reg1, reg2),
            Subn(reg1, reg2) => write!(f, "SUBN {}, {}", reg1, reg2),
            Shl(reg1, reg2) => write!(f, "SHL {}, {}", reg1, reg2),
            SneReg(reg1, reg2) => write!(f, "SNE {}, {}", reg1, reg2),
            LdI(addr) => write!(f, "LD I, {}", addr),
            JpV0(addr) => write!(f, "JP V0, {}", addr),
            Rnd(reg, b) => write!(f, "RND {}, #{:02X}", reg, b),
            Drw(reg1, reg2, n) => write!(f, "DRW {}, {}, {}", reg1, reg2, n),
            Skp(reg) => write!(f, "SKP {}", reg),
            Sknp(reg) => write!(f, "SKNP {}", reg),
            LdRegDt(reg) => write!(f, "LD {}, DT", reg),
            LdKey(reg) => write!(f, "LD {}, K", reg),
            LdDtReg(reg) => write!(f, "LD DT, {}", reg),
            LdSt(reg) => write!(f, "LD ST, {}", reg),
            AddI(reg) => write!(f, "ADD I, {}", reg),
            LdF(reg) => write!(f, "LD F, {}", reg),
            LdB(reg) => write!(f, "LD B, {}", reg),
            LdDerefIReg(reg) => write!(f, "LD [I], {}", reg),
            LdRegDerefI(reg) => write!(f, "LD {}, [I]", reg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Instruction::*;
    use super::Register::*;

    fn decode(op: u16) -> Result<Instruction, InvalidOpcodeError> {
        Instruction::from_opcode(Opcode(op))
    }

    fn addr(a: usize) -> Address {
        Address::from_usize(a).unwrap()
    }

    /// Tests decoding of every opcode family in the standard table.
    #[test]
    fn decode_table() {
        let cases = [
            (0x0123, Sys(addr(0x123))),
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x1ABC, Jp(addr(0xABC))),
            (0x2600, Call(addr(0x600))),
            (0x3A12, SeByte(VA, 0x12)),
            (0x4B34, SneByte(VB, 0x34)),
            (0x5120, SeReg(V1, V2)),
            (0x6F05, LdByte(VF, 0x05)),
            (0x70FF, AddByte(V0, 0xFF)),
            (0x8120, LdReg(V1, V2)),
            (0x8341, Or(V3, V4)),
            (0x8562, And(V5, V6)),
            (0x8783, Xor(V7, V8)),
            (0x89A4, AddReg(V9, VA)),
            (0x8BC5, Sub(VB, VC)),
            (0x8DE6, Shr(VD, VE)),
            (0x8F07, Subn(VF, V0)),
            (0x812E, Shl(V1, V2)),
            (0x9340, SneReg(V3, V4)),
            (0xA2F0, LdI(addr(0x2F0))),
            (0xB300, JpV0(addr(0x300))),
            (0xC50F, Rnd(V5, 0x0F)),
            (0xD125, Drw(V1, V2, 5)),
            (0xE79E, Skp(V7)),
            (0xE8A1, Sknp(V8)),
            (0xF107, LdRegDt(V1)),
            (0xF20A, LdKey(V2)),
            (0xF315, LdDtReg(V3)),
            (0xF418, LdSt(V4)),
            (0xF51E, AddI(V5)),
            (0xF629, LdF(V6)),
            (0xF733, LdB(V7)),
            (0xF855, LdDerefIReg(V8)),
            (0xF965, LdRegDerefI(V9)),
        ];

        for &(op, ref expected) in cases.iter() {
            assert_eq!(decode(op).as_ref(), Ok(expected), "opcode {:#06X}", op);
        }
    }

    /// Tests that patterns outside the table are rejected.
    #[test]
    fn decode_invalid() {
        for &op in [0x5121, 0x800F, 0x8008, 0x9001, 0xE000, 0xE09F, 0xF000, 0xF0FF, 0xF075]
            .iter()
        {
            assert_eq!(decode(op), Err(InvalidOpcodeError(Opcode(op))), "opcode {:#06X}", op);
        }
    }

    #[test]
    fn opcode_display() {
        assert_eq!(Opcode(0xD12F).to_string(), "#D12F");
    }

    #[test]
    fn display_mnemonics() {
        assert_eq!(decode(0x6005).unwrap().to_string(), "LD V0, #05");
        assert_eq!(decode(0xA21E).unwrap().to_string(), "LD I, #21E");
        assert_eq!(decode(0xD345).unwrap().to_string(), "DRW V3, V4, 5");
        assert_eq!(decode(0xFA55).unwrap().to_string(), "LD [I], VA");
    }

    #[test]
    fn address_bounds() {
        assert_eq!(Address::from_u16(0xFFF).unwrap().addr(), 0xFFF);
        assert_eq!(Address::from_u16(0x1000), Err(AddressOutOfBoundsError(0x1000)));
    }
}
