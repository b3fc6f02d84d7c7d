// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, Local};
use ls8::machine::RuntimeOptions;

/// Logs a message to stderr with a given prefix if the emulator was started
/// with the verbose flag set. Stdout is left to the program's PRN output.
pub fn log<P, T>(prefix: P, text: T, runtime_options: &RuntimeOptions) where P: Into<String>, T: Into<String> {
    if runtime_options.verbose {
        eprintln!("{}", format_line(Local::now(), prefix, text));
    }
}

fn format_line<P, T>(time: DateTime<Local>, prefix: P, text: T) -> String where P: Into<String>, T: Into<String> {
    format!("[{}] -- [{}] {}", time, prefix.into(), text.into())
}
