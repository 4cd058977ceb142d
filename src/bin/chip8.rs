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

//! The `chip8` binary program.
//!
//! This runs a program without a window: keys can be held down for the whole
//! run, and the final contents of the display are printed as text.

extern crate chip8_vm;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate maplit;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::process;

use clap::{App, Arg, ArgMatches};
use failure::{Error, ResultExt};
use log::LevelFilter;

use chip8_vm::Emulator;
use chip8_vm::emulator::Options;
use chip8_vm::input::Key;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// An error resulting from a character with no corresponding key.
#[derive(Debug, Fail)]
#[fail(display = "no key is mapped to '{}'", _0)]
struct UnmappedKeyError(char);

/// Returns the default keymap, which lays the Chip-8 keypad out over the
/// left-hand side of a QWERTY keyboard.
fn default_keymap() -> HashMap<char, Key> {
    use Key::*;

    hashmap![
        '1' => K1,
        '2' => K2,
        '3' => K3,
        '4' => KC,
        'q' => K4,
        'w' => K5,
        'e' => K6,
        'r' => KD,
        'a' => K7,
        's' => K8,
        'd' => K9,
        'f' => KE,
        'z' => KA,
        'x' => K0,
        'c' => KB,
        'v' => KF,
    ]
}

/// Translates a string of keyboard characters into Chip-8 keys.
fn parse_keys(keys: &str, keymap: &HashMap<char, Key>) -> Result<Vec<Key>, UnmappedKeyError> {
    keys.chars()
        .map(|c| {
            keymap
                .get(&c.to_ascii_lowercase())
                .cloned()
                .ok_or(UnmappedKeyError(c))
        })
        .collect()
}

fn main() {
    let matches = App::new("chip8")
        .version(VERSION)
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("A headless Chip-8 interpreter")
        .help_message("show this help message and exit")
        .version_message("show version information and exit")
        .arg(
            Arg::with_name("cpu-frequency")
                .long("cpu-frequency")
                .value_name("FREQ")
                .help("set instructions executed per second")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("fast")
                .long("fast")
                .help("run as fast as possible instead of in real time"),
        )
        .arg(
            Arg::with_name("frames")
                .short("f")
                .long("frames")
                .value_name("N")
                .help("stop after N timer ticks")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("frequency")
                .long("frequency")
                .value_name("FREQ")
                .help("set game timer frequency (in Hz)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("keys")
                .short("k")
                .long("keys")
                .value_name("KEYS")
                .help("hold down the given keys (1234/qwer/asdf/zxcv layout)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("load-quirks")
                .short("l")
                .long("load-quirks")
                .help("enable load quirks mode"),
        )
        .arg(
            Arg::with_name("shift-quirks")
                .short("q")
                .long("shift-quirks")
                .help("enable shift quirks mode"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase verbosity"),
        )
        .arg(
            Arg::with_name("FILE")
                .help("set the program file to run")
                .required(true)
                .index(1),
        )
        .get_matches();

    let verbosity = matches.occurrences_of("verbose");
    let filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, filter)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.iter_chain().skip(1) {
            info!("caused by: {}", cause);
        }
        trace!("backtrace: {}", e.backtrace());
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut opts = Options::new();
    process_opts(&mut opts, matches)?;
    let max_frames = match matches.value_of("frames") {
        Some(n) => Some(n.parse::<u64>().context("invalid frames argument")?),
        None => None,
    };
    let held = parse_keys(matches.value_of("keys").unwrap_or(""), &default_keymap())
        .context("invalid keys argument")?;

    let filename = matches.value_of("FILE").unwrap();
    let mut input =
        File::open(filename).with_context(|_| format!("could not open file '{}'", filename))?;
    let mut emulator = Emulator::with_options(opts);
    emulator
        .load_program(&mut input)
        .with_context(|_| format!("could not load program from file '{}'", filename))?;
    for &key in held.iter() {
        emulator.keypad_mut().press(key);
    }

    let mut frames = 0u64;
    let mut buzzing = false;
    // The necessary context for any error in 'execute' should be provided
    // from the emulator itself; the display is printed either way.
    let result = emulator.execute(|emu| {
        frames += 1;
        if emu.sound_active() != buzzing {
            buzzing = emu.sound_active();
            info!("buzzer {} at tick {}", if buzzing { "on" } else { "off" }, frames);
        }
        Ok(max_frames.map_or(true, |max| frames < max))
    });

    let stdout = io::stdout();
    let mut output = stdout.lock();
    write!(output, "{}", emulator.display())?;
    result
}

/// Processes the command-line arguments and changes the necessary fields of
/// the given emulator options.
fn process_opts(opts: &mut Options, matches: &ArgMatches) -> Result<(), Error> {
    if let Some(freq) = matches.value_of("frequency") {
        opts.timer_freq = freq.parse::<u32>().context("invalid frequency argument")?;
    }
    if let Some(freq) = matches.value_of("cpu-frequency") {
        opts.cpu_freq = freq.parse::<u32>()
            .context("invalid CPU frequency argument")?;
    }
    if matches.is_present("fast") {
        opts.realtime = false;
    }
    if matches.is_present("load-quirks") {
        opts.load_quirks = true;
    }
    if matches.is_present("shift-quirks") {
        opts.shift_quirks = true;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_from_characters() {
        let keymap = default_keymap();
        assert_eq!(
            parse_keys("1Qv", &keymap).unwrap(),
            vec![Key::K1, Key::K4, Key::KF]
        );
        assert!(parse_keys("", &keymap).unwrap().is_empty());
        assert_eq!(parse_keys("1p", &keymap).unwrap_err().0, 'p');
    }
}
