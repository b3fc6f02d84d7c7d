// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::LoadError;
use std::fs::File;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;

// Everything after this character on a line is ignored.
const COMMENT_MARKER: char = '#';

// Each instruction byte is written as exactly this many binary digits.
const BYTE_DIGITS: usize = 8;

/// Reads an LS-8 program file at a given path and returns its bytes in
/// order, ready to be loaded at address 0x00.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    let mut source = String::new();
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(ref e) if e.kind() == ErrorKind::NotFound => {
            return Err(LoadError::NotFound { path: path.display().to_string() })
        }
        Err(e) => return Err(LoadError::Io(e)),
    };
    file.read_to_string(&mut source).map_err(LoadError::Io)?;
    parse_program(&source)
}

/// Parses program source. Each non-empty line holds one byte as an 8 digit
/// binary literal, e.g. `10000010`. Comments start with `#` and run to the
/// end of the line; lines that are blank once the comment is stripped are
/// skipped.
pub fn parse_program(source: &str) -> Result<Vec<u8>, LoadError> {
    let mut program = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let text = match line.find(COMMENT_MARKER) {
            Some(pos) => &line[..pos],
            None => line,
        }.trim();

        if text.is_empty() {
            continue;
        }
        program.push(parse_byte(text, index + 1)?);
    }
    Ok(program)
}

fn parse_byte(text: &str, line: usize) -> Result<u8, LoadError> {
    let malformed = || LoadError::MalformedProgramLine { line: line, text: String::from(text) };

    // from_str_radix alone would also take a leading '+' or fewer digits.
    if text.len() != BYTE_DIGITS || !text.chars().all(|c| c == '0' || c == '1') {
        return Err(malformed());
    }
    u8::from_str_radix(text, 2).map_err(|_| malformed())
}
