// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

enum ParseState {
    ScanningForArguments,
    ScanningArgument,
    ScanningQuotedArgument,
}

/// Returns true if the character passed is a whitespace character. Both spaces
/// and tabs are considered whitespace characters.
fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Returns true if the character passed is a quote.
fn is_quote(c: char) -> bool {
    c == '"'
}

/// Parses a raw debugger input line into a list of separate arguments.
/// Arguments are separated by whitespace and can be quoted to keep whitespace
/// inside of them. A quote that never closes is an error.
pub fn input_to_arguments<S: AsRef<str>>(input: S) -> Result<Vec<String>, &'static str> {
    let mut state = ParseState::ScanningForArguments;
    let mut args: Vec<String> = Vec::new();
    let mut arg = String::new();

    for c in input.as_ref().chars() {
        match state {
            ParseState::ScanningForArguments => {
                // Determine a scanning state depending on the first
                // non-whitespace character.
                if is_quote(c) {
                    state = ParseState::ScanningQuotedArgument;
                } else if !is_whitespace(c) {
                    state = ParseState::ScanningArgument;
                    arg.push(c);
                }
            }
            ParseState::ScanningArgument => {
                if is_whitespace(c) {
                    args.push(arg.split_off(0));
                    state = ParseState::ScanningForArguments;
                } else {
                    arg.push(c);
                }
            }
            ParseState::ScanningQuotedArgument => {
                if is_quote(c) {
                    args.push(arg.split_off(0));
                    state = ParseState::ScanningForArguments;
                } else {
                    arg.push(c);
                }
            }
        }
    }

    match state {
        ParseState::ScanningQuotedArgument => Err("quoted arg does not close"),
        ParseState::ScanningArgument => {
            args.push(arg);
            Ok(args)
        }
        ParseState::ScanningForArguments => Ok(args),
    }
}

/// Parses a number typed at the debugger prompt. Hex values take a `0x`
/// prefix, anything else is decimal.
pub fn parse_number(arg: &str) -> Result<usize, &'static str> {
    let parsed = if arg.starts_with("0x") || arg.starts_with("0X") {
        usize::from_str_radix(&arg[2..], 16)
    } else {
        arg.parse::<usize>()
    };
    parsed.map_err(|_| "invalid number")
}
