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

//! The Chip-8 emulator.
//!
//! The main focus of this module is the `Emulator` struct, which ties the
//! CPU to its memory and peripherals and provides the main interface to be
//! used by the front-end.  Several options can be configured using the
//! `Options` struct, such as the instruction rate and the quirks modes.
//!
//! Timers and instructions run at independent rates: the delay and sound
//! timers tick once per clock tick (normally 60 Hz), while the CPU executes
//! as many instructions per tick as the configured CPU frequency allows.

use std::default::Default;
use std::io::Read;
use std::thread;
use std::time::Duration;

use failure::{Error, ResultExt};

use cpu::{Bus, Cpu, Quirks};
use display;
use input::Keypad;
use memory::Memory;
use rom::Rom;
use timer::{Clock, Countdown};

/// How long to sleep when there is nothing to do until the next tick.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Options for the emulator.
pub struct Options {
    /// The number of instructions to execute per second (default 700).
    pub cpu_freq: u32,
    /// The frequency at which to tick the timers, in Hz (default 60).
    pub timer_freq: u32,
    /// Whether timer ticks follow wall-clock time (default `true`).
    pub realtime: bool,
    /// Whether to enable load quirks mode (default `false`).
    pub load_quirks: bool,
    /// Whether to enable shift quirks mode (default `false`).
    pub shift_quirks: bool,
}

impl Options {
    /// Returns the default set of options.
    pub fn new() -> Self {
        Options {
            cpu_freq: 700,
            timer_freq: 60,
            realtime: true,
            load_quirks: false,
            shift_quirks: false,
        }
    }

    /// Returns a set of options useful for testing (a stepped clock, so that
    /// every pass through the execution loop is exactly one tick).
    pub fn testing() -> Self {
        Options {
            realtime: false,
            ..Options::new()
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::new()
    }
}

/// A Chip-8 emulator.
///
/// This struct contains the entire state of a Chip-8 machine and provides
/// all the expected methods for interacting with it, such as loading a
/// program, stepping through execution and inspecting the internal state.
///
/// # Examples
///
/// ```
/// use chip8_vm::{Emulator, Register};
///
/// let mut emulator = Emulator::new();
/// // LD V0, #05; ADD V0, #03
/// emulator.load(&[0x60, 0x05, 0x70, 0x03]).unwrap();
/// emulator.single_step().unwrap();
/// emulator.single_step().unwrap();
/// assert_eq!(emulator.cpu().register(Register::V0), 8);
/// assert_eq!(emulator.cpu().pc(), 0x204);
/// ```
pub struct Emulator {
    cpu: Cpu,
    memory: Memory,
    /// The most recently loaded program, reloaded on reset.
    rom: Option<Rom>,
    keypad: Keypad,
    display: display::Buffer,
    sound: Countdown,
    delay: Countdown,
    /// The tick source for the timers.
    clock: Clock,
    /// The number of instructions to execute per tick.
    steps_per_tick: u32,
    /// Whether the emulator has been halted.
    halted: bool,
}

impl Emulator {
    /// Returns a new emulator with the default options.
    pub fn new() -> Self {
        Emulator::with_options(Options::default())
    }

    /// Returns a new emulator using the given options.
    pub fn with_options(options: Options) -> Self {
        let quirks = Quirks {
            shift: options.shift_quirks,
            load: options.load_quirks,
        };

        let clock = if options.realtime {
            Clock::new(options.timer_freq)
        } else {
            Clock::stepped(options.timer_freq)
        };
        let steps_per_tick = (options.cpu_freq / clock.frequency()).max(1);
        debug!(
            "timers at {} Hz, {} instructions per tick",
            clock.frequency(),
            steps_per_tick
        );

        Emulator {
            cpu: Cpu::new(quirks),
            memory: Memory::new(),
            rom: None,
            keypad: Keypad::new(),
            display: display::Buffer::new(),
            sound: Countdown::new(),
            delay: Countdown::new(),
            clock,
            steps_per_tick,
            halted: false,
        }
    }

    /// Loads the given program bytes and resets the machine.
    ///
    /// If the program is too large, the machine is left untouched.
    pub fn load(&mut self, program: &[u8]) -> Result<(), Error> {
        let rom = Rom::new(program)?;
        self.load_rom(rom);
        Ok(())
    }

    /// Loads program data from the specified source and resets the machine.
    pub fn load_program<R: Read>(&mut self, input: &mut R) -> Result<(), Error> {
        let rom = Rom::read(input).context("could not read program")?;
        self.load_rom(rom);
        Ok(())
    }

    /// Loads the given ROM and resets the machine.
    pub fn load_rom(&mut self, rom: Rom) {
        info!("loaded program of {} bytes", rom.len());
        self.rom = Some(rom);
        self.reset();
    }

    /// Restores the power-on state and reloads the current program, if any.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.reset();
        self.display.clear();
        self.keypad.reset();
        self.sound.set(0);
        self.delay.set(0);
        self.halted = false;
        if let Some(ref rom) = self.rom {
            self.memory.load_rom(rom);
        }
        info!("machine reset");
    }

    /// Performs a single execution step.
    ///
    /// This does nothing once the emulator has been halted.
    pub fn single_step(&mut self) -> Result<(), Error> {
        if self.halted {
            return Ok(());
        }

        let mut bus = Bus {
            memory: &mut self.memory,
            display: &mut self.display,
            keypad: &mut self.keypad,
            delay: &mut self.delay,
            sound: &mut self.sound,
        };
        self.cpu.step(&mut bus)
    }

    /// Advances the delay and sound timers by one tick.
    pub fn tick(&mut self) {
        let was_active = self.sound.is_active();
        self.delay.tick();
        self.sound.tick();
        if was_active && !self.sound.is_active() {
            debug!("sound stopped");
        }
    }

    /// Runs the loaded program until it is halted, fails or is cancelled.
    ///
    /// The `frame` function is called once per timer tick, after the timers
    /// have been updated, and is where the host should render the display,
    /// update the keypad and start or stop sound.  Returning `false` from it
    /// stops execution.
    ///
    /// Errors from the program itself are returned as-is; the emulator is
    /// left in the state just before the failing instruction.
    pub fn execute<F>(&mut self, mut frame: F) -> Result<(), Error>
    where
        F: FnMut(&mut Emulator) -> Result<bool, Error>,
    {
        let mut budget = 0u64;

        loop {
            if self.halted {
                info!("emulator was halted");
                return Ok(());
            }

            for _ in 0..self.clock.lap() {
                if self.halted {
                    break;
                }
                self.tick();
                budget += u64::from(self.steps_per_tick);
                if !frame(self)? {
                    info!("execution cancelled");
                    return Ok(());
                }
            }

            while budget > 0 && !self.halted {
                if let Err(e) = self.single_step() {
                    warn!("stopping at {:#05X}: {}", self.cpu.pc(), e);
                    return Err(e);
                }
                budget -= 1;
            }

            if self.clock.realtime() {
                thread::sleep(IDLE_SLEEP);
            }
        }
    }

    /// Halts the emulator.  A halted emulator executes no more instructions
    /// until it is reset or a new program is loaded.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Returns whether the emulator has been halted.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Returns whether the sound should currently be playing.
    pub fn sound_active(&self) -> bool {
        self.sound.is_active()
    }

    /// Returns a reference to the CPU.
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Returns a mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Returns a reference to the memory.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns a mutable reference to the memory.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Returns the loaded program, if any.
    pub fn rom(&self) -> Option<&Rom> {
        self.rom.as_ref()
    }

    /// Returns a reference to the display buffer.
    pub fn display(&self) -> &display::Buffer {
        &self.display
    }

    /// Returns a mutable reference to the display buffer.
    pub fn display_mut(&mut self) -> &mut display::Buffer {
        &mut self.display
    }

    /// Returns a reference to the keypad.
    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// Returns a mutable reference to the keypad.
    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    /// Returns a reference to the delay timer.
    pub fn delay(&self) -> &Countdown {
        &self.delay
    }

    /// Returns a mutable reference to the delay timer.
    pub fn delay_mut(&mut self) -> &mut Countdown {
        &mut self.delay
    }

    /// Returns a reference to the sound timer.
    pub fn sound(&self) -> &Countdown {
        &self.sound
    }

    /// Returns a mutable reference to the sound timer.
    pub fn sound_mut(&mut self) -> &mut Countdown {
        &mut self.sound
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Emulator::new()
    }
}
