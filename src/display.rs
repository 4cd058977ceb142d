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

//! The Chip-8 display buffer.

use std::default::Default;
use std::fmt;

use failure::Fail;

/// The width of the display.
pub const WIDTH: usize = 64;
/// The height of the display.
pub const HEIGHT: usize = 32;

/// The height of a hex digit sprite.
pub const HEX_HEIGHT: usize = 5;

/// The hex digit sprites.
pub const HEX_SPRITES: [[u8; HEX_HEIGHT]; 16] = [
    [0xF0, 0x90, 0x90, 0x90, 0xF0],
    [0x20, 0x60, 0x20, 0x20, 0x70],
    [0xF0, 0x10, 0xF0, 0x80, 0xF0],
    [0xF0, 0x10, 0xF0, 0x10, 0xF0],
    [0x90, 0x90, 0xF0, 0x10, 0x10],
    [0xF0, 0x80, 0xF0, 0x10, 0xF0],
    [0xF0, 0x80, 0xF0, 0x90, 0xF0],
    [0xF0, 0x10, 0x20, 0x40, 0x40],
    [0xF0, 0x90, 0xF0, 0x90, 0xF0],
    [0xF0, 0x90, 0xF0, 0x10, 0xF0],
    [0xF0, 0x90, 0xF0, 0x90, 0x90],
    [0xE0, 0x90, 0xE0, 0x90, 0xE0],
    [0xF0, 0x80, 0x80, 0x80, 0xF0],
    [0xE0, 0x90, 0x90, 0x90, 0xE0],
    [0xF0, 0x80, 0xF0, 0x80, 0xF0],
    [0xF0, 0x80, 0xF0, 0x80, 0x80],
];

/// A Chip-8 display buffer.
///
/// Pixels are only ever changed by clearing the whole buffer or by XOR-ing a
/// sprite onto it.  Sprites wrap around both edges of the screen.
///
/// # Examples
///
/// ```
/// use chip8_vm::display::Buffer;
///
/// let mut buf = Buffer::new();
/// assert!(!buf.draw(62, 0, &[0b1111_0000]));
/// assert!(buf.is_set(63, 0));
/// assert!(buf.is_set(0, 0));
/// assert!(buf.draw(62, 0, &[0b1000_0000]));
/// assert!(!buf.is_set(62, 0));
/// ```
pub struct Buffer {
    /// The underlying display buffer data, indexed by column then row.
    data: [[bool; HEIGHT]; WIDTH],
    /// Whether the display needs to be refreshed.
    needs_refresh: bool,
}

impl Buffer {
    /// Returns a new display buffer with all pixels clear.
    pub fn new() -> Self {
        Buffer {
            data: [[false; HEIGHT]; WIDTH],
            needs_refresh: true,
        }
    }

    /// Clears the display.
    pub fn clear(&mut self) {
        for col in self.data.iter_mut() {
            for elem in col.iter_mut() {
                *elem = false;
            }
        }
        self.needs_refresh = true;
    }

    /// Returns a reference to the underlying pixel data.
    pub fn data(&self) -> &[[bool; HEIGHT]; WIDTH] {
        &self.data
    }

    /// Returns whether the given pixel is set.  Pixels outside the screen are
    /// never set.
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.data[x][y]
    }

    /// Draws the given sprite at the given position.
    ///
    /// Each byte of the sprite is one row of eight pixels, most significant
    /// bit leftmost.  The starting position and every pixel wrap around the
    /// edges of the screen.
    ///
    /// Returns whether there was a collision.
    pub fn draw(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let (x, y) = (x % WIDTH, y % HEIGHT);
        let mut collision = false;

        for (j, row) in sprite.iter().enumerate() {
            for i in 0..8 {
                if row & (0x80 >> i) != 0 && self.toggle(x + i, y + j) {
                    collision = true;
                }
            }
        }

        collision
    }

    /// Returns whether the display has changed since the last refresh.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Refreshes the display using the given refresh function.
    ///
    /// If a refresh is unnecessary, nothing will be done.  The refresh
    /// function receives a "snapshot" of the display, and should draw that to
    /// whatever user-facing display buffer is currently being used.
    pub fn refresh<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
        E: Fail,
    {
        if self.needs_refresh {
            f(self)?;
            self.needs_refresh = false;
        }
        Ok(())
    }

    /// Flips the on/off state of the given (wrapped) pixel, returning whether
    /// it was flipped off from the on state.
    fn toggle(&mut self, x: usize, y: usize) -> bool {
        let (x, y) = (x % WIDTH, y % HEIGHT);
        let old = self.data[x][y];
        self.data[x][y] = !old;
        self.needs_refresh = true;

        old
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

/// Renders the buffer as text, one line per row, with `#` for set pixels and
/// `.` for clear ones.
impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                write!(f, "{}", if self.data[x][y] { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::usize;

    use super::*;

    #[derive(Debug, Fail)]
    #[fail(display = "refresh failed")]
    struct RefreshError;

    /// Drawing the same sprite twice erases it and reports a collision.
    #[test]
    fn draw_twice_erases() {
        let mut buf = Buffer::new();
        let sprite = HEX_SPRITES[8];

        assert!(!buf.draw(10, 5, &sprite));
        assert!(buf.is_set(10, 5));
        assert!(buf.is_set(13, 5));
        assert!(!buf.is_set(14, 5));
        assert!(buf.is_set(10, 6));
        assert!(!buf.is_set(11, 6));

        assert!(buf.draw(10, 5, &sprite));
        for x in 0..WIDTH {
            for y in 0..HEIGHT {
                assert!(!buf.is_set(x, y), "pixel ({}, {})", x, y);
            }
        }
    }

    /// Collisions are only reported for pixels turned off.
    #[test]
    fn no_collision_on_disjoint_pixels() {
        let mut buf = Buffer::new();
        assert!(!buf.draw(0, 0, &[0b1010_1010]));
        assert!(!buf.draw(0, 0, &[0b0101_0101]));
        for x in 0..8 {
            assert!(buf.is_set(x, 0));
        }
    }

    #[test]
    fn wraps_vertically() {
        let mut buf = Buffer::new();
        buf.draw(0, HEIGHT - 1, &[0x80, 0x80]);
        assert!(buf.is_set(0, HEIGHT - 1));
        assert!(buf.is_set(0, 0));
    }

    /// Starting coordinates beyond the screen wrap as well.
    #[test]
    fn wraps_start_position() {
        let mut buf = Buffer::new();
        buf.draw(WIDTH + 3, HEIGHT + 2, &[0x80]);
        assert!(buf.is_set(3, 2));
        assert!(!buf.is_set(WIDTH + 3, HEIGHT + 2));

        let mut buf = Buffer::new();
        assert!(!buf.draw(usize::MAX, usize::MAX, &[0xC0, 0x80]));
        // usize::MAX is one less than a multiple of both dimensions.
        assert!(buf.is_set(WIDTH - 1, HEIGHT - 1));
        assert!(buf.is_set(0, HEIGHT - 1));
        assert!(buf.is_set(WIDTH - 1, 0));
        assert!(!buf.is_set(0, 0));
    }

    #[test]
    fn clear() {
        let mut buf = Buffer::new();
        buf.draw(5, 5, &[0xFF; 4]);
        buf.clear();
        assert!(buf.data().iter().all(|col| col.iter().all(|&p| !p)));
    }

    #[test]
    fn refresh_tracking() {
        let mut buf = Buffer::new();
        let mut calls = 0;
        buf.refresh(|_| -> Result<(), RefreshError> {
            calls += 1;
            Ok(())
        }).unwrap();
        buf.refresh(|_| -> Result<(), RefreshError> {
            calls += 1;
            Ok(())
        }).unwrap();
        assert_eq!(calls, 1);

        buf.draw(0, 0, &[0x80]);
        assert!(buf.needs_refresh());
        assert!(buf.refresh(|_| Err(RefreshError)).is_err());
        assert!(buf.needs_refresh());
    }

    #[test]
    fn text_rendering() {
        let mut buf = Buffer::new();
        buf.draw(1, 0, &[0x80]);
        let text = buf.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), HEIGHT);
        assert!(lines[0].starts_with(".#.."));
        assert_eq!(lines[1], ".".repeat(WIDTH));
    }
}
