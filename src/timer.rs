/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! The delay and sound timers, and the clock that drives them.

use std::num::Wrapping;
use std::time::Duration;

use time;

/// An 8-bit countdown timer, as used for both `DT` and `ST`.
///
/// The timer counts down by one on every `tick` until it reaches zero.
///
/// ```
/// use chip8_vm::timer::Countdown;
///
/// let mut timer = Countdown::new();
/// timer.set(2);
/// timer.tick();
/// assert_eq!(timer.get(), 1);
/// timer.tick();
/// timer.tick();
/// assert_eq!(timer.get(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    value: u8,
}

impl Countdown {
    /// Returns a new timer at zero.
    pub fn new() -> Self {
        Countdown::default()
    }

    /// Returns the current value.
    pub fn get(&self) -> u8 {
        self.value
    }

    /// Sets the current value.
    pub fn set(&mut self, val: u8) {
        self.value = val;
    }

    /// Decrements the timer, stopping at zero.
    pub fn tick(&mut self) {
        self.value = self.value.saturating_sub(1);
    }

    /// Returns whether the timer is still counting (for the sound timer, this
    /// means the buzzer is on).
    pub fn is_active(&self) -> bool {
        self.value != 0
    }
}

/// A fixed-rate tick source.
///
/// A real-time clock derives its ticks from the system's monotonic clock.  A
/// stepped clock instead reports exactly one tick every time it is polled,
/// which makes runs deterministic.
#[derive(Debug)]
pub struct Clock {
    /// Whether ticks follow wall-clock time.
    realtime: bool,
    /// The frequency at which to run the clock.
    frequency: u32,
    /// An internal number of ticks.
    ticks: Wrapping<u32>,
}

impl Clock {
    /// Returns a new real-time clock running at the given frequency.
    pub fn new(frequency: u32) -> Self {
        let mut clock = Clock::stepped(frequency);
        clock.realtime = true;
        clock.update();
        clock
    }

    /// Returns a new clock at the given frequency which ticks once per call to
    /// `lap`.
    ///
    /// A frequency of zero is raised to 1 Hz.
    pub fn stepped(frequency: u32) -> Self {
        Clock {
            realtime: false,
            frequency: frequency.max(1),
            ticks: Wrapping(0),
        }
    }

    /// Returns whether this clock follows wall-clock time.
    pub fn realtime(&self) -> bool {
        self.realtime
    }

    /// Returns the frequency of the clock, in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Returns the nominal time between two ticks.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.frequency))
    }

    /// Returns the number of ticks which have elapsed since the last call to
    /// this method (or the creation of the clock).
    ///
    /// A stepped clock always returns 1.
    pub fn lap(&mut self) -> u32 {
        if self.realtime {
            let old = self.ticks;
            self.update();
            (self.ticks - old).0
        } else {
            1
        }
    }

    /// Updates the internal tick count from the system clock.
    fn update(&mut self) {
        let ticks = u128::from(time::precise_time_ns()) * u128::from(self.frequency) / 1_000_000_000;
        self.ticks = Wrapping(ticks as u32);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn countdown_stops_at_zero() {
        let mut timer = Countdown::new();
        assert!(!timer.is_active());
        timer.tick();
        assert_eq!(timer.get(), 0);

        timer.set(3);
        assert!(timer.is_active());
        for _ in 0..3 {
            timer.tick();
        }
        assert_eq!(timer.get(), 0);
        assert!(!timer.is_active());
    }

    #[test]
    fn stepped_clock_ticks_once_per_lap() {
        let mut clock = Clock::stepped(60);
        assert!(!clock.realtime());
        for _ in 0..10 {
            assert_eq!(clock.lap(), 1);
        }
    }

    #[test]
    fn realtime_clock_follows_time() {
        let mut clock = Clock::new(1000);
        assert!(clock.realtime());
        thread::sleep(Duration::from_millis(20));
        let ticks = clock.lap();
        assert!(ticks >= 10, "only {} ticks in 20ms at 1kHz", ticks);
        assert_eq!(clock.period(), Duration::from_millis(1));
    }

    #[test]
    fn zero_frequency_runs_at_one_hertz() {
        let clock = Clock::new(0);
        assert_eq!(clock.frequency(), 1);
        assert_eq!(clock.period(), Duration::from_secs(1));
        assert_eq!(Clock::stepped(0).frequency(), 1);

        let mut clock = Clock::new(0);
        thread::sleep(Duration::from_millis(1100));
        assert!(clock.lap() >= 1);
    }
}
