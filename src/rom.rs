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

//! Chip-8 program images.

use std::io::Read;

use failure::Error;

use PROG_SIZE;

/// An error resulting from an input program being too large.
#[derive(Debug, Fail, PartialEq, Eq)]
#[fail(display = "input program is too large (maximum size is {} bytes)", _0)]
pub struct RomTooLargeError(pub usize);

/// A program image, ready to be loaded at `PROG_START`.
///
/// A ROM is raw program bytes with no header or framing.  The only thing
/// checked is that it fits between `PROG_START` and the end of memory.
///
/// ```
/// use chip8_vm::Rom;
///
/// let rom = Rom::new(&[0x60, 0x05, 0x70, 0x03]).unwrap();
/// assert_eq!(rom.len(), 4);
/// assert!(Rom::new(&[0; 0x1000]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Returns a ROM containing the given bytes.
    pub fn new(data: &[u8]) -> Result<Self, RomTooLargeError> {
        if data.len() > PROG_SIZE {
            Err(RomTooLargeError(PROG_SIZE))
        } else {
            Ok(Rom {
                data: data.to_vec(),
            })
        }
    }

    /// Reads a ROM from the given source, stopping as soon as it is clear
    /// that the program is too large.
    pub fn read<R: Read>(input: &mut R) -> Result<Self, Error> {
        let mut data = Vec::with_capacity(PROG_SIZE);
        input
            .by_ref()
            .take(PROG_SIZE as u64 + 1)
            .read_to_end(&mut data)?;
        if data.len() > PROG_SIZE {
            return Err(RomTooLargeError(PROG_SIZE).into());
        }
        Ok(Rom { data })
    }

    /// Returns the program bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the size of the program, in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the program is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn largest_program_fits() {
        let rom = Rom::new(&[0xAA; PROG_SIZE]).unwrap();
        assert_eq!(rom.len(), PROG_SIZE);
        assert_eq!(Rom::new(&[0; PROG_SIZE + 1]), Err(RomTooLargeError(PROG_SIZE)));
    }

    #[test]
    fn read_from_source() {
        let mut input = Cursor::new(vec![0x12, 0x00]);
        let rom = Rom::read(&mut input).unwrap();
        assert_eq!(rom.data(), &[0x12, 0x00]);

        let mut input = Cursor::new(Vec::<u8>::new());
        assert!(Rom::read(&mut input).unwrap().is_empty());
    }

    #[test]
    fn read_too_large() {
        let mut input = Cursor::new(vec![0u8; PROG_SIZE + 10]);
        let err = Rom::read(&mut input).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RomTooLargeError>(),
            Some(&RomTooLargeError(PROG_SIZE))
        );
    }
}
