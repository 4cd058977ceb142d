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

//! The Chip-8 memory.
//!
//! Memory is a flat array of `MEM_SIZE` bytes.  Every access is range-checked
//! and reports an `AddressOutOfBoundsError` rather than panicking, so that a
//! misbehaving program can be stopped cleanly.

use std::cmp;
use std::default::Default;

use MEM_SIZE;
use PROG_START;
use display::{HEX_HEIGHT, HEX_SPRITES};
use instruction::AddressOutOfBoundsError;
use rom::Rom;

/// The location at which to put the hex digit sprites.
pub const FONT_START: usize = 0x0;

/// The Chip-8 memory.
pub struct Memory {
    data: [u8; MEM_SIZE],
}

impl Memory {
    /// Returns a new memory containing only the built-in font.
    pub fn new() -> Self {
        let mut mem = Memory { data: [0; MEM_SIZE] };
        mem.reset();
        mem
    }

    /// Zeroes the entire memory and reinstalls the built-in font.
    pub fn reset(&mut self) {
        for b in self.data.iter_mut() {
            *b = 0;
        }
        for (i, sprite) in HEX_SPRITES.iter().enumerate() {
            let start = FONT_START + i * HEX_HEIGHT;
            self.data[start..start + HEX_HEIGHT].copy_from_slice(sprite);
        }
    }

    /// Returns the byte at the given address.
    pub fn read(&self, addr: u16) -> Result<u8, AddressOutOfBoundsError> {
        Ok(self.slice(addr, 1)?[0])
    }

    /// Writes a byte to the given address.
    pub fn write(&mut self, addr: u16, val: u8) -> Result<(), AddressOutOfBoundsError> {
        self.slice_mut(addr, 1)?[0] = val;
        Ok(())
    }

    /// Returns the big-endian word starting at the given address.
    ///
    /// ```
    /// use chip8_vm::Memory;
    ///
    /// let mut mem = Memory::new();
    /// mem.write(0x200, 0x12).unwrap();
    /// mem.write(0x201, 0x34).unwrap();
    /// assert_eq!(mem.read_word(0x200).unwrap(), 0x1234);
    /// assert!(mem.read_word(0xFFF).is_err());
    /// ```
    pub fn read_word(&self, addr: u16) -> Result<u16, AddressOutOfBoundsError> {
        let bytes = self.slice(addr, 2)?;
        Ok((bytes[0] as u16) << 8 | bytes[1] as u16)
    }

    /// Returns the `len` bytes starting at the given address.
    pub fn slice(&self, addr: u16, len: usize) -> Result<&[u8], AddressOutOfBoundsError> {
        let start = check_range(addr, len)?;
        Ok(&self.data[start..start + len])
    }

    /// Returns a mutable reference to the `len` bytes starting at the given
    /// address.
    pub fn slice_mut(
        &mut self,
        addr: u16,
        len: usize,
    ) -> Result<&mut [u8], AddressOutOfBoundsError> {
        let start = check_range(addr, len)?;
        Ok(&mut self.data[start..start + len])
    }

    /// Copies the given data into memory starting at the given address.
    ///
    /// Nothing is written if any part of the data would fall outside of
    /// memory.
    pub fn load(&mut self, addr: u16, data: &[u8]) -> Result<(), AddressOutOfBoundsError> {
        self.slice_mut(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Copies the given program into memory at `PROG_START`.
    pub fn load_rom(&mut self, rom: &Rom) {
        self.data[PROG_START..PROG_START + rom.len()].copy_from_slice(rom.data());
    }

}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

/// Checks that `len` bytes starting at `addr` are addressable, returning the
/// start as an index.
///
/// The reported error address is the first one that is out of bounds.
fn check_range(addr: u16, len: usize) -> Result<usize, AddressOutOfBoundsError> {
    let start = addr as usize;
    if start + len > MEM_SIZE {
        Err(AddressOutOfBoundsError(cmp::max(start, MEM_SIZE)))
    } else {
        Ok(start)
    }
}
