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

//! Input handling for the Chip-8 keypad.

use std::default::Default;

use num::traits::FromPrimitive;

/// The number of keys on the Chip-8 controller.
pub const N_KEYS: usize = 16;

enum_from_primitive!{
/// The keys on the Chip-8 controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    K0 = 0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF
}
}

impl Key {
    /// Returns the key corresponding to the lowest four bits of the given
    /// byte.
    pub fn from_byte(b: u8) -> Key {
        Key::from_u8(b % N_KEYS as u8).unwrap()
    }
}

/// The state of the keypad.
///
/// Besides the current up/down state of each key, the keypad remembers the
/// most recent key that went from released to pressed.  This is what the
/// `LD Vx, K` instruction waits for, so that a key which was already held
/// down when the wait started does not satisfy it.
///
/// # Examples
///
/// ```
/// use chip8_vm::input::{Key, Keypad};
///
/// let mut keypad = Keypad::new();
/// keypad.press(Key::K7);
/// assert!(keypad.is_pressed(Key::K7));
/// assert_eq!(keypad.take_pressed(), Some(Key::K7));
/// assert_eq!(keypad.take_pressed(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    /// The key states (`true` means "pressed").
    keys: [bool; N_KEYS],
    /// The last key to transition to the pressed state, if not yet consumed.
    last_pressed: Option<Key>,
}

impl Keypad {
    /// Returns a new keypad with all keys unpressed.
    pub fn new() -> Self {
        Keypad::default()
    }

    /// Marks the given key as pressed.
    pub fn press(&mut self, key: Key) {
        if !self.keys[key as usize] {
            self.last_pressed = Some(key);
        }
        self.keys[key as usize] = true;
    }

    /// Marks the given key as released.
    pub fn release(&mut self, key: Key) {
        self.keys[key as usize] = false;
    }

    /// Releases every key and forgets any pending press.
    pub fn reset(&mut self) {
        *self = Keypad::default();
    }

    /// Returns whether the given key is pressed.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys[key as usize]
    }

    /// Returns the last key that was newly pressed, if any, and forgets it.
    pub fn take_pressed(&mut self) -> Option<Key> {
        self.last_pressed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_byte_uses_low_nibble() {
        assert_eq!(Key::from_byte(0x0A), Key::KA);
        assert_eq!(Key::from_byte(0xF3), Key::K3);
    }

    #[test]
    fn press_and_release() {
        let mut keypad = Keypad::new();
        assert!(!keypad.is_pressed(Key::K1));
        keypad.press(Key::K1);
        assert!(keypad.is_pressed(Key::K1));
        assert!(!keypad.is_pressed(Key::K2));
        keypad.release(Key::K1);
        assert!(!keypad.is_pressed(Key::K1));
    }

    /// Holding a key down doesn't produce another press transition.
    #[test]
    fn held_key_is_not_pressed_again() {
        let mut keypad = Keypad::new();
        keypad.press(Key::KC);
        assert_eq!(keypad.take_pressed(), Some(Key::KC));
        keypad.press(Key::KC);
        assert_eq!(keypad.take_pressed(), None);

        keypad.release(Key::KC);
        keypad.press(Key::KC);
        assert_eq!(keypad.take_pressed(), Some(Key::KC));
    }

    #[test]
    fn latest_press_wins() {
        let mut keypad = Keypad::new();
        keypad.press(Key::K4);
        keypad.press(Key::K9);
        assert_eq!(keypad.take_pressed(), Some(Key::K9));

        keypad.reset();
        assert!(!keypad.is_pressed(Key::K4));
        assert_eq!(keypad.take_pressed(), None);
    }
}
