// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

extern crate getopts;
extern crate ls8;

use getopts::Options;
use ls8::debugger::debugger::Debugger;
use ls8::io::errors::*;
use ls8::io::loader;
use ls8::ls8::machine::{Machine, RuntimeOptions};
use std::env;
use std::io::stdout;

/// Prints usage information for the emulator.
fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] PROGRAM", program);
    eprint!("{}", opts.usage(&brief));
}

/// Initializes and starts the emulator. Returns an exit code after which the
/// program unwinds and stops executing. A program that runs to HLT ends the
/// emulator with EXIT_HALTED, quitting the debugger before that with
/// EXIT_SUCCESS.
fn init() -> i32 {
    let args: Vec<String> = env::args().collect();
    let program = match args.first() {
        Some(program) => program.clone(),
        None => String::from("ls8"),
    };

    let mut opts = Options::new();
    opts.optflag("v", "verbose", "log machine events to stderr");
    opts.optflag("t", "trace", "log a trace line before every instruction");
    opts.optflag("d", "debug", "start the interactive debugger");
    opts.optflag("h", "help", "print this help menu");

    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}: {}", program, e);
            print_usage(&program, &opts);
            return EXIT_FAILURE;
        }
    };

    if matches.opt_present("h") {
        print_usage(&program, &opts);
        return EXIT_SUCCESS;
    }

    let path = match matches.free.first() {
        Some(path) => path.clone(),
        None => {
            print_usage(&program, &opts);
            return EXIT_FAILURE;
        }
    };

    // Tracing is logged, so it implies verbose output.
    let runtime_options = RuntimeOptions {
        verbose: matches.opt_present("v") || matches.opt_present("t"),
        trace: matches.opt_present("t"),
        debug: matches.opt_present("d"),
    };

    let bytes = match loader::load_program(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}: {}", program, e);
            return e.exit_code();
        }
    };

    let mut machine = Machine::new(runtime_options, stdout());
    if let Err(e) = machine.load(&bytes) {
        eprintln!("{}: {}", program, e);
        return e.exit_code();
    }

    let result = if runtime_options.debug {
        Debugger::new().run(&mut machine)
    } else {
        machine.run()
    };

    match result {
        Ok(()) => machine.exit_code(),
        Err(e) => {
            eprintln!("{}: {}", program, e);
            if runtime_options.verbose {
                eprintln!("{}", machine.cpu());
            }
            e.exit_code()
        }
    }
}

/// Entry point of the program and wrapper of init. Takes the exit code returned
/// from init and exits with it.
fn main() {
    let exit_code = init();
    std::process::exit(exit_code); // Unwinding done, safe to exit.
}
